pub mod prompts;
pub mod rubric;

pub use prompts::{
    contract_analysis_prompts, context_extraction_prompts, evaluation_prompts, report_prompts,
    PromptPair,
};
pub use rubric::{LegalArticle, LegalRubric, RubricError};

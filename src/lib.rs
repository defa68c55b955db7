//! LeaseGuard: evidence-grounded tenant defense engine.
//!
//! From structured lease data, a photographic evidence ledger and a free-text
//! tenant question, the pipeline drafts a legally grounded defense report by
//! orchestrating three dependent model calls and reconciling the model's
//! frequently malformed output into strict structured data.

pub mod config;
pub mod models;
pub mod recovery; // JSON repair for non-conformant model output
pub mod gateway; // sole contact point with the completion endpoint
pub mod citations; // law citation marking + lookup seam
pub mod composer; // legal rubric + stage prompt assembly
pub mod ledger; // evidence records, persistence seam, batch uploads
pub mod compare; // before/after damage comparison
pub mod contract; // lease document → structured LeaseData
pub mod pipeline; // three-stage defense orchestrator

pub use compare::{compare_item, grade_deterioration, quick_match};
pub use composer::LegalRubric;
pub use config::GatewayConfig;
pub use contract::ContractAnalyzer;
pub use gateway::{ChatModel, CompletionClient};
pub use ledger::EvidenceLedger;
pub use models::{CaseContext, CaseEvaluation, DamageAnalysis, DefenseReport, LeaseData};
pub use pipeline::{DefenseOutcome, DefensePipeline, Stage, StageFailure};

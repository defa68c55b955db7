pub mod claim;
pub mod orchestrator;
pub mod report;

pub use claim::{analyze_claim, ClaimAction, ClaimDossier};
pub use orchestrator::{DefenseOutcome, DefensePipeline};
pub use report::{structure_report, validate_report};

use thiserror::Error;

/// The three pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Context,
    Report,
    Evaluation,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Context => write!(f, "Context"),
            Self::Report => write!(f, "Report"),
            Self::Evaluation => write!(f, "Evaluation"),
        }
    }
}

/// A fatal stage failure. Carries the identity of the failed stage and
/// remediation advice reconstructed from the documentation gaps.
#[derive(Error, Debug)]
#[error("cannot generate defense — {stage} stage failed: {reason}")]
pub struct StageFailure {
    pub stage: Stage,
    pub reason: String,
    pub remediation: Vec<String>,
}

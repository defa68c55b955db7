pub mod repair;

pub use repair::{parse_array_lenient, recover, recover_value, repair_json};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecoveryError {
    /// Repair heuristics exhausted. The caller must supply its own
    /// domain-specific fallback value; this module never invents one.
    #[error("unrecoverable model output: {reason} (near: {snippet})")]
    Unrecoverable { reason: String, snippet: String },

    #[error("recovered JSON does not match the expected schema: {0}")]
    SchemaMismatch(String),
}

pub mod batch;
pub mod ledger;
pub mod store;

pub use batch::{upload_batch, PhotoUploader, UploadError};
pub use ledger::{DocumentationGap, EvidenceLedger, ItemEvidence};
pub use store::{DocumentStore, InMemoryDocumentStore, StoreError};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    /// Invariant violation; fatal to the operation, not to the pipeline.
    #[error("validation error: {0}")]
    Validation(String),

    #[error("unknown inspection item: {0}")]
    UnknownItem(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

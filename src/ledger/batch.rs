//! All-or-nothing batch photo upload.
//!
//! Uploads for one batch run concurrently and are joined before anything is
//! written to the ledger: if any single upload fails, no partial photo set is
//! recorded for that batch.

use thiserror::Error;

use crate::models::EvidencePhase;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("photo upload failed: {0}")]
    Failed(String),

    #[error("upload worker panicked")]
    WorkerPanicked,
}

/// Binary photo storage collaborator. Returns an opaque photo reference
/// (URL or store key) the ledger records verbatim.
pub trait PhotoUploader: Sync {
    fn upload(
        &self,
        item_id: &str,
        phase: EvidencePhase,
        bytes: &[u8],
    ) -> Result<String, UploadError>;
}

/// Upload every photo of a batch concurrently and join.
///
/// Returns the references in input order. Any individual failure fails the
/// whole batch and nothing should be written to the ledger.
pub fn upload_batch<U: PhotoUploader>(
    uploader: &U,
    item_id: &str,
    phase: EvidencePhase,
    photos: &[Vec<u8>],
) -> Result<Vec<String>, UploadError> {
    if photos.is_empty() {
        return Ok(vec![]);
    }

    let results: Vec<Result<String, UploadError>> = std::thread::scope(|scope| {
        let handles: Vec<_> = photos
            .iter()
            .map(|bytes| scope.spawn(move || uploader.upload(item_id, phase, bytes)))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or(Err(UploadError::WorkerPanicked)))
            .collect()
    });

    let mut refs = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Ok(photo_ref) => refs.push(photo_ref),
            Err(e) => {
                tracing::warn!(item = %item_id, %phase, error = %e, "batch upload aborted");
                return Err(e);
            }
        }
    }
    Ok(refs)
}

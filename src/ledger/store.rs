//! Abstract key-value persistence collaborator.
//!
//! The core never assumes a concrete store, only that writes are
//! last-write-wins per key and that an unset optional field is OMITTED from
//! the written document. The observed backend rejects any write containing a
//! null-equivalent, so the in-memory test double enforces the same rule.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;
use thiserror::Error;

use crate::models::{EvidencePhase, EvidenceRecord};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),

    /// The document contains an unresolved optional. The collaborator
    /// rejects such writes wholesale; serialize with skip-if-none instead.
    #[error("document contains a null field at {0}")]
    NullField(String),

    #[error("stored document is not valid: {0}")]
    Corrupt(String),
}

pub trait DocumentStore {
    fn put(&self, key: &str, document: Value) -> Result<(), StoreError>;
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;
}

/// Key for one evidence record.
pub fn evidence_key(lease_id: &str, item_id: &str, phase: EvidencePhase) -> String {
    format!("lease/{lease_id}/evidence/{item_id}/{phase}")
}

/// Key for one completed pipeline run.
pub fn defense_key(lease_id: &str, run_id: &str) -> String {
    format!("lease/{lease_id}/defense/{run_id}")
}

/// Persist an evidence record under its (lease, item, phase) key.
pub fn persist_evidence<S: DocumentStore>(
    store: &S,
    lease_id: &str,
    record: &EvidenceRecord,
) -> Result<(), StoreError> {
    let document = serde_json::to_value(record)
        .map_err(|e| StoreError::Backend(e.to_string()))?;
    store.put(&evidence_key(lease_id, &record.item_id, record.phase), document)
}

/// Persist a completed pipeline artifact under the lease's defense key.
pub fn persist_defense<S: DocumentStore, T: serde::Serialize>(
    store: &S,
    lease_id: &str,
    run_id: &str,
    artifact: &T,
) -> Result<(), StoreError> {
    let document =
        serde_json::to_value(artifact).map_err(|e| StoreError::Backend(e.to_string()))?;
    store.put(&defense_key(lease_id, run_id), document)
}

pub fn load_evidence<S: DocumentStore>(
    store: &S,
    lease_id: &str,
    item_id: &str,
    phase: EvidencePhase,
) -> Result<Option<EvidenceRecord>, StoreError> {
    match store.get(&evidence_key(lease_id, item_id, phase))? {
        None => Ok(None),
        Some(document) => serde_json::from_value(document)
            .map(Some)
            .map_err(|e| StoreError::Corrupt(e.to_string())),
    }
}

/// In-memory store double. Mirrors the production backend's two observable
/// behaviors: last-write-wins per key, and rejection of null fields.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    documents: Mutex<HashMap<String, Value>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.lock().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn put(&self, key: &str, document: Value) -> Result<(), StoreError> {
        if let Some(path) = first_null_path(&document, "$") {
            return Err(StoreError::NullField(path));
        }
        self.documents
            .lock()
            .map_err(|_| StoreError::Backend("store lock poisoned".into()))?
            .insert(key.to_string(), document);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self
            .documents
            .lock()
            .map_err(|_| StoreError::Backend("store lock poisoned".into()))?
            .get(key)
            .cloned())
    }
}

fn first_null_path(value: &Value, path: &str) -> Option<String> {
    match value {
        Value::Null => Some(path.to_string()),
        Value::Object(map) => map
            .iter()
            .find_map(|(k, v)| first_null_path(v, &format!("{path}.{k}"))),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .find_map(|(i, v)| first_null_path(v, &format!("{path}[{i}]"))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(notes: Option<&str>) -> EvidenceRecord {
        EvidenceRecord {
            item_id: "kitchen_counter".into(),
            phase: EvidencePhase::Intake,
            photos: vec!["https://store/1.jpg".into()],
            captured_at: Utc::now(),
            notes: notes.map(str::to_string),
            analyses: vec![],
        }
    }

    #[test]
    fn evidence_round_trips_through_store() {
        let store = InMemoryDocumentStore::new();
        let original = record(Some("small mark near sink"));
        persist_evidence(&store, "lease-1", &original).unwrap();

        let loaded = load_evidence(&store, "lease-1", "kitchen_counter", EvidencePhase::Intake)
            .unwrap()
            .unwrap();
        assert_eq!(loaded.photos, original.photos);
        assert_eq!(loaded.notes.as_deref(), Some("small mark near sink"));
    }

    #[test]
    fn unset_optionals_never_reach_the_store_as_null() {
        let store = InMemoryDocumentStore::new();
        // notes is None; must be omitted from the document, not written as null
        persist_evidence(&store, "lease-1", &record(None)).unwrap();

        let document = store
            .get(&evidence_key("lease-1", "kitchen_counter", EvidencePhase::Intake))
            .unwrap()
            .unwrap();
        assert!(document.get("notes").is_none());
    }

    #[test]
    fn store_rejects_explicit_null_fields() {
        let store = InMemoryDocumentStore::new();
        let document = serde_json::json!({"photos": ["a.jpg"], "notes": null});
        let err = store.put("lease/x/evidence/y/intake", document).unwrap_err();
        assert!(matches!(err, StoreError::NullField(path) if path.contains("notes")));
    }

    #[test]
    fn store_rejects_nested_nulls() {
        let store = InMemoryDocumentStore::new();
        let document = serde_json::json!({"analyses": [{"analysis": {"state_grade": null}}]});
        let err = store.put("k", document).unwrap_err();
        assert!(matches!(err, StoreError::NullField(_)));
    }

    #[test]
    fn writes_are_last_write_wins() {
        let store = InMemoryDocumentStore::new();
        store.put("k", serde_json::json!({"v": 1})).unwrap();
        store.put("k", serde_json::json!({"v": 2})).unwrap();
        assert_eq!(store.get("k").unwrap().unwrap()["v"], 2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn defense_artifact_persists_under_run_key() {
        let store = InMemoryDocumentStore::new();
        let artifact = serde_json::json!({
            "case_id": "CASE-123",
            "summary": "Strong position under Art. 267 CO",
        });
        persist_defense(&store, "lease-1", "run-9", &artifact).unwrap();

        let loaded = store
            .get(&defense_key("lease-1", "run-9"))
            .unwrap()
            .unwrap();
        assert_eq!(loaded["case_id"], "CASE-123");
    }

    #[test]
    fn missing_key_reads_as_none() {
        let store = InMemoryDocumentStore::new();
        assert!(load_evidence(&store, "lease-1", "nope", EvidencePhase::Checkout)
            .unwrap()
            .is_none());
    }
}

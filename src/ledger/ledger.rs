//! The evidence ledger; single source of truth for photographic evidence.
//!
//! One ledger per lease. Records are keyed by (inspection item, phase); photo
//! lists only grow, and append order decides which photo is primary, so
//! same-key appends serialize behind the ledger lock while independent
//! comparison runs for different items interleave freely.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::models::{
    AttachedAnalysis, Completeness, DamageAnalysis, EvidencePhase, EvidenceRecord, InspectionItem,
};

use super::LedgerError;

/// An evidence gap: an item whose documentation is not complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentationGap {
    pub item_id: String,
    pub description: String,
}

/// Snapshot of one item's evidence across both phases, for prompt assembly.
#[derive(Debug, Clone)]
pub struct ItemEvidence {
    pub item: InspectionItem,
    pub intake: Option<EvidenceRecord>,
    pub checkout: Option<EvidenceRecord>,
    pub completeness: Completeness,
}

pub struct EvidenceLedger {
    items: Vec<InspectionItem>,
    records: Mutex<HashMap<(String, EvidencePhase), EvidenceRecord>>,
}

impl EvidenceLedger {
    /// A ledger over the inspection checklist produced by contract analysis.
    pub fn new(items: Vec<InspectionItem>) -> Self {
        Self {
            items,
            records: Mutex::new(HashMap::new()),
        }
    }

    pub fn items(&self) -> &[InspectionItem] {
        &self.items
    }

    /// Append photos to the record for (item, phase), creating it on first
    /// write. Creating a record with zero photos is a validation error; so is
    /// an intake capture dated after an existing checkout capture (or the
    /// reverse), since intake must precede checkout.
    pub fn record_evidence(
        &self,
        item_id: &str,
        phase: EvidencePhase,
        photos: &[String],
        notes: Option<&str>,
        captured_at: DateTime<Utc>,
    ) -> Result<EvidenceRecord, LedgerError> {
        if !self.items.iter().any(|i| i.id == item_id) {
            return Err(LedgerError::UnknownItem(item_id.to_string()));
        }

        let mut records = self.lock_records();
        let key = (item_id.to_string(), phase);

        if !records.contains_key(&key) {
            if photos.is_empty() {
                return Err(LedgerError::Validation(format!(
                    "cannot create {phase} record for '{item_id}' with zero photos"
                )));
            }
            self.check_phase_ordering(&records, item_id, phase, captured_at)?;
            let record = EvidenceRecord {
                item_id: item_id.to_string(),
                phase,
                photos: photos.to_vec(),
                captured_at,
                notes: notes.map(str::to_string),
                analyses: vec![],
            };
            tracing::info!(item = %item_id, %phase, photos = photos.len(), "evidence record created");
            records.insert(key.clone(), record.clone());
            return Ok(record);
        }

        let record = records
            .get_mut(&key)
            .ok_or_else(|| LedgerError::Validation("record vanished under lock".into()))?;
        record.photos.extend(photos.iter().cloned());
        if let Some(notes) = notes {
            record.notes = Some(notes.to_string());
        }
        tracing::info!(
            item = %item_id,
            %phase,
            appended = photos.len(),
            total = record.photos.len(),
            "evidence appended"
        );
        Ok(record.clone())
    }

    /// Attach a new damage analysis to the item's checkout record. Prior
    /// analyses are kept, ordered by attach time; a newer pass supersedes,
    /// never rewrites.
    pub fn attach_analysis(
        &self,
        item_id: &str,
        analysis: DamageAnalysis,
        attached_at: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        let mut records = self.lock_records();
        let key = (item_id.to_string(), EvidencePhase::Checkout);
        let record = records.get_mut(&key).ok_or_else(|| {
            LedgerError::Validation(format!(
                "no checkout evidence for '{item_id}' — record photos before attaching an analysis"
            ))
        })?;
        record.analyses.push(AttachedAnalysis {
            attached_at,
            analysis,
        });
        tracing::info!(item = %item_id, passes = record.analyses.len(), "damage analysis attached");
        Ok(())
    }

    /// All analyses ever attached for an item, oldest first.
    pub fn analyses(&self, item_id: &str) -> Vec<AttachedAnalysis> {
        let records = self.lock_records();
        records
            .get(&(item_id.to_string(), EvidencePhase::Checkout))
            .map(|r| r.analyses.clone())
            .unwrap_or_default()
    }

    pub fn latest_analysis(&self, item_id: &str) -> Option<DamageAnalysis> {
        self.analyses(item_id).pop().map(|a| a.analysis)
    }

    pub fn record(&self, item_id: &str, phase: EvidencePhase) -> Option<EvidenceRecord> {
        self.lock_records()
            .get(&(item_id.to_string(), phase))
            .cloned()
    }

    /// complete iff both phases hold ≥1 photo; missing iff neither does.
    /// Any non-empty but one-sided photo set is partial; angle-level
    /// completeness is never inferred.
    pub fn completeness_of(&self, item_id: &str) -> Completeness {
        let records = self.lock_records();
        let has = |phase| {
            records
                .get(&(item_id.to_string(), phase))
                .map(|r| !r.photos.is_empty())
                .unwrap_or(false)
        };
        match (has(EvidencePhase::Intake), has(EvidencePhase::Checkout)) {
            (true, true) => Completeness::Complete,
            (false, false) => Completeness::Missing,
            _ => Completeness::Partial,
        }
    }

    /// Every item whose documentation is not complete, with a gap description
    /// usable directly in the evidence-gap narrative and in user-facing
    /// remediation advice.
    pub fn missing_documentation_report(&self) -> Vec<DocumentationGap> {
        let mut gaps = Vec::new();
        for item in &self.items {
            let records = self.lock_records();
            let has_intake = records
                .get(&(item.id.clone(), EvidencePhase::Intake))
                .is_some_and(|r| !r.photos.is_empty());
            let has_checkout = records
                .get(&(item.id.clone(), EvidencePhase::Checkout))
                .is_some_and(|r| !r.photos.is_empty());
            drop(records);

            let description = match (has_intake, has_checkout) {
                (true, true) => continue,
                (false, false) => format!(
                    "no photos at all — add intake and checkout photos for {}",
                    item.name
                ),
                (true, false) => format!(
                    "no checkout documentation — add checkout photos for {}",
                    item.name
                ),
                (false, true) => format!(
                    "no intake baseline — pre-existing condition of {} cannot be proven",
                    item.name
                ),
            };
            gaps.push(DocumentationGap {
                item_id: item.id.clone(),
                description,
            });
        }
        gaps
    }

    /// Per-item snapshot across both phases, in checklist order.
    pub fn snapshot(&self) -> Vec<ItemEvidence> {
        let records = self.lock_records();
        self.items
            .iter()
            .map(|item| {
                let intake = records.get(&(item.id.clone(), EvidencePhase::Intake)).cloned();
                let checkout = records
                    .get(&(item.id.clone(), EvidencePhase::Checkout))
                    .cloned();
                let completeness = match (
                    intake.as_ref().is_some_and(|r| !r.photos.is_empty()),
                    checkout.as_ref().is_some_and(|r| !r.photos.is_empty()),
                ) {
                    (true, true) => Completeness::Complete,
                    (false, false) => Completeness::Missing,
                    _ => Completeness::Partial,
                };
                ItemEvidence {
                    item: item.clone(),
                    intake,
                    checkout,
                    completeness,
                }
            })
            .collect()
    }

    /// Every photo reference across all items and phases, intake first.
    pub fn all_photo_refs(&self) -> Vec<String> {
        let mut refs = Vec::new();
        for entry in self.snapshot() {
            if let Some(record) = &entry.intake {
                refs.extend(record.photos.iter().cloned());
            }
            if let Some(record) = &entry.checkout {
                refs.extend(record.photos.iter().cloned());
            }
        }
        refs
    }

    fn check_phase_ordering(
        &self,
        records: &HashMap<(String, EvidencePhase), EvidenceRecord>,
        item_id: &str,
        phase: EvidencePhase,
        captured_at: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        let other_phase = match phase {
            EvidencePhase::Intake => EvidencePhase::Checkout,
            EvidencePhase::Checkout => EvidencePhase::Intake,
        };
        if let Some(other) = records.get(&(item_id.to_string(), other_phase)) {
            let violated = match phase {
                EvidencePhase::Intake => captured_at > other.captured_at,
                EvidencePhase::Checkout => captured_at < other.captured_at,
            };
            if violated {
                return Err(LedgerError::Validation(format!(
                    "intake capture for '{item_id}' must not be later than its checkout capture"
                )));
            }
        }
        Ok(())
    }

    fn lock_records(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<(String, EvidencePhase), EvidenceRecord>> {
        match self.records.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Priority;
    use chrono::Duration;

    fn item(id: &str, name: &str) -> InspectionItem {
        InspectionItem {
            id: id.to_string(),
            name: name.to_string(),
            room: None,
            description: format!("Photograph {name}"),
            photo_angles: vec![],
            recommended_photos: Some(2),
            priority: Priority::High,
            reason: None,
            contract_reference: None,
        }
    }

    fn ledger() -> EvidenceLedger {
        EvidenceLedger::new(vec![
            item("kitchen_counter", "Kitchen Countertops"),
            item("bath_tiles", "Bathroom Tiles"),
        ])
    }

    fn photos(urls: &[&str]) -> Vec<String> {
        urls.iter().map(|u| u.to_string()).collect()
    }

    #[test]
    fn photo_list_is_exactly_concatenation_in_call_order() {
        let ledger = ledger();
        let now = Utc::now();
        ledger
            .record_evidence(
                "kitchen_counter",
                EvidencePhase::Intake,
                &photos(&["a.jpg", "b.jpg"]),
                None,
                now,
            )
            .unwrap();
        let record = ledger
            .record_evidence(
                "kitchen_counter",
                EvidencePhase::Intake,
                &photos(&["c.jpg"]),
                None,
                now,
            )
            .unwrap();
        assert_eq!(record.photos, photos(&["a.jpg", "b.jpg", "c.jpg"]));
        assert_eq!(record.primary_photo(), Some("a.jpg"));
        // Timestamp fixed by the first write
        assert_eq!(record.captured_at, now);
    }

    #[test]
    fn creating_record_with_zero_photos_is_rejected() {
        let ledger = ledger();
        let err = ledger
            .record_evidence("kitchen_counter", EvidencePhase::Intake, &[], None, Utc::now())
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn appending_zero_photos_to_existing_record_is_a_noop() {
        let ledger = ledger();
        let now = Utc::now();
        ledger
            .record_evidence("bath_tiles", EvidencePhase::Intake, &photos(&["a.jpg"]), None, now)
            .unwrap();
        let record = ledger
            .record_evidence("bath_tiles", EvidencePhase::Intake, &[], None, now)
            .unwrap();
        assert_eq!(record.photos, photos(&["a.jpg"]));
    }

    #[test]
    fn unknown_item_is_rejected() {
        let ledger = ledger();
        let err = ledger
            .record_evidence("garage", EvidencePhase::Intake, &photos(&["a.jpg"]), None, Utc::now())
            .unwrap_err();
        assert!(matches!(err, LedgerError::UnknownItem(_)));
    }

    #[test]
    fn intake_after_checkout_violates_phase_ordering() {
        let ledger = ledger();
        let checkout_at = Utc::now();
        ledger
            .record_evidence(
                "kitchen_counter",
                EvidencePhase::Checkout,
                &photos(&["out.jpg"]),
                None,
                checkout_at,
            )
            .unwrap();
        let err = ledger
            .record_evidence(
                "kitchen_counter",
                EvidencePhase::Intake,
                &photos(&["in.jpg"]),
                None,
                checkout_at + Duration::days(1),
            )
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn completeness_moves_only_forward() {
        let ledger = ledger();
        let start = Utc::now();
        assert_eq!(ledger.completeness_of("kitchen_counter"), Completeness::Missing);

        ledger
            .record_evidence(
                "kitchen_counter",
                EvidencePhase::Intake,
                &photos(&["in.jpg"]),
                None,
                start,
            )
            .unwrap();
        assert_eq!(ledger.completeness_of("kitchen_counter"), Completeness::Partial);

        ledger
            .record_evidence(
                "kitchen_counter",
                EvidencePhase::Checkout,
                &photos(&["out.jpg"]),
                None,
                start + Duration::days(300),
            )
            .unwrap();
        assert_eq!(ledger.completeness_of("kitchen_counter"), Completeness::Complete);

        // Appending more photos never moves completeness backward
        ledger
            .record_evidence(
                "kitchen_counter",
                EvidencePhase::Checkout,
                &photos(&["out2.jpg"]),
                None,
                start + Duration::days(300),
            )
            .unwrap();
        assert_eq!(ledger.completeness_of("kitchen_counter"), Completeness::Complete);
    }

    #[test]
    fn partial_item_appears_in_missing_documentation_report() {
        let ledger = ledger();
        ledger
            .record_evidence(
                "kitchen_counter",
                EvidencePhase::Intake,
                &photos(&["in.jpg"]),
                None,
                Utc::now(),
            )
            .unwrap();

        assert_eq!(ledger.completeness_of("kitchen_counter"), Completeness::Partial);
        let gaps = ledger.missing_documentation_report();
        let counter_gap = gaps
            .iter()
            .find(|g| g.item_id == "kitchen_counter")
            .unwrap();
        assert!(counter_gap.description.contains("checkout"));
        assert!(counter_gap.description.contains("Kitchen Countertops"));
        // The untouched item is reported too
        assert!(gaps.iter().any(|g| g.item_id == "bath_tiles"));
    }

    #[test]
    fn analyses_supersede_without_mutation() {
        let ledger = ledger();
        let now = Utc::now();
        ledger
            .record_evidence(
                "bath_tiles",
                EvidencePhase::Checkout,
                &photos(&["out.jpg"]),
                None,
                now,
            )
            .unwrap();

        let first = DamageAnalysis::unverified("first pass");
        let mut second = DamageAnalysis::unverified("second pass");
        second.has_damage = true;

        ledger.attach_analysis("bath_tiles", first, now).unwrap();
        ledger
            .attach_analysis("bath_tiles", second, now + Duration::minutes(5))
            .unwrap();

        let history = ledger.analyses("bath_tiles");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].analysis.description, "first pass");
        let latest = ledger.latest_analysis("bath_tiles").unwrap();
        assert_eq!(latest.description, "second pass");
        assert!(latest.has_damage);
    }

    #[test]
    fn attach_analysis_requires_checkout_record() {
        let ledger = ledger();
        let err = ledger
            .attach_analysis("bath_tiles", DamageAnalysis::unverified("x"), Utc::now())
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn concurrent_appends_to_different_items_all_land() {
        let ledger = std::sync::Arc::new(ledger());
        let now = Utc::now();
        std::thread::scope(|scope| {
            for (item_id, url) in [("kitchen_counter", "k.jpg"), ("bath_tiles", "b.jpg")] {
                let ledger = std::sync::Arc::clone(&ledger);
                scope.spawn(move || {
                    for i in 0..20 {
                        ledger
                            .record_evidence(
                                item_id,
                                EvidencePhase::Intake,
                                &[format!("{i}-{url}")],
                                None,
                                now,
                            )
                            .unwrap();
                    }
                });
            }
        });
        let kitchen = ledger.record("kitchen_counter", EvidencePhase::Intake).unwrap();
        let bath = ledger.record("bath_tiles", EvidencePhase::Intake).unwrap();
        assert_eq!(kitchen.photos.len(), 20);
        assert_eq!(bath.photos.len(), 20);
    }

    #[test]
    fn snapshot_follows_checklist_order() {
        let ledger = ledger();
        ledger
            .record_evidence(
                "bath_tiles",
                EvidencePhase::Intake,
                &photos(&["b.jpg"]),
                None,
                Utc::now(),
            )
            .unwrap();
        let snapshot = ledger.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].item.id, "kitchen_counter");
        assert_eq!(snapshot[0].completeness, Completeness::Missing);
        assert_eq!(snapshot[1].item.id, "bath_tiles");
        assert_eq!(snapshot[1].completeness, Completeness::Partial);
    }
}

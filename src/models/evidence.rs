//! Photographic evidence records and damage verdicts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The two capture moments bracketing a lease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidencePhase {
    Intake,
    Checkout,
}

impl std::fmt::Display for EvidencePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Intake => write!(f, "intake"),
            Self::Checkout => write!(f, "checkout"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    None,
    Minor,
    Moderate,
    Major,
}

/// Qualitative deterioration grade from the simple comparison pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateGrade {
    #[serde(rename = "A+")]
    APlus,
    A,
    B,
    C,
    D,
    F,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepairEstimate {
    None,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

/// Structured damage verdict for one inspection item.
///
/// Produced once per comparison pass; a later pass creates a new analysis
/// that supersedes; never mutates; the prior one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DamageAnalysis {
    #[serde(default)]
    pub has_damage: bool,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_true")]
    pub is_normal_wear: bool,
    #[serde(default)]
    pub tenant_liable: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub damage_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub specific_issues: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liability_reasoning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repair_estimate: Option<RepairEstimate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub same_location: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_confidence: Option<ConfidenceTier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photos_analyzed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_grade: Option<StateGrade>,
}

impl DamageAnalysis {
    /// The verdict used whenever a comparison cannot be completed: no damage,
    /// normal wear, tenant not liable. Liability is never assigned without a
    /// verifiable model verdict.
    pub fn unverified(description: &str) -> Self {
        Self {
            has_damage: false,
            severity: Severity::None,
            description: description.to_string(),
            is_normal_wear: true,
            tenant_liable: false,
            damage_types: vec![],
            specific_issues: vec![],
            liability_reasoning: Some("Analysis inconclusive".to_string()),
            repair_estimate: Some(RepairEstimate::None),
            same_location: None,
            location_confidence: None,
            photos_analyzed: None,
            state_grade: None,
        }
    }
}

fn default_true() -> bool {
    true
}

/// A damage analysis together with the moment it was attached to the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachedAnalysis {
    pub attached_at: DateTime<Utc>,
    pub analysis: DamageAnalysis,
}

/// Evidence for one (inspection item, phase) pair.
///
/// The photo list is append-only; `captured_at` is fixed by the first write.
/// A record with an empty photo list never exists; creation requires at
/// least one photo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceRecord {
    pub item_id: String,
    pub phase: EvidencePhase,
    pub photos: Vec<String>,
    pub captured_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Superseding history, oldest first. The last entry is current.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub analyses: Vec<AttachedAnalysis>,
}

impl EvidenceRecord {
    /// The first photo is primary: ordering determines which capture
    /// represents the item in summaries.
    pub fn primary_photo(&self) -> Option<&str> {
        self.photos.first().map(String::as_str)
    }

    pub fn latest_analysis(&self) -> Option<&DamageAnalysis> {
        self.analyses.last().map(|a| &a.analysis)
    }
}

/// Documentation completeness of one inspection item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Completeness {
    /// Both phases hold at least one photo.
    Complete,
    /// Exactly one phase holds photos.
    Partial,
    /// Neither phase holds photos.
    Missing,
}

impl std::fmt::Display for Completeness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Complete => write!(f, "complete"),
            Self::Partial => write!(f, "partial"),
            Self::Missing => write!(f, "missing"),
        }
    }
}

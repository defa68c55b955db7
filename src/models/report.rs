//! Pipeline stage artifacts: case context, defense report, case evaluation.

use serde::{Deserialize, Serialize};

use super::evidence::{Completeness, ConfidenceTier, DamageAnalysis};
use super::lease::{Clause, InfoItem, Irregularity, Priority, Responsibilities};

// ──────────────────────────────────────────────
// Stage 1: CaseContext
// ──────────────────────────────────────────────

/// Lease facts restructured for legal analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeaseContext {
    #[serde(default)]
    pub asset_type: String,
    #[serde(default)]
    pub asset_name: String,
    #[serde(default)]
    pub risk_score: u8,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub info: Vec<InfoItem>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clauses: Vec<Clause>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responsibilities: Option<Responsibilities>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub irregularities: Vec<Irregularity>,
}

/// Per-item flags for absent documentation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MissingPhotos {
    #[serde(default)]
    pub intake_missing: bool,
    #[serde(default)]
    pub checkout_missing: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// One inspection item's evidence as the extraction stage summarized it.
///
/// Photo URLs are preserved verbatim; later stages embed them directly, so
/// a rewritten or paraphrased URL would break the report's evidence links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceItemSummary {
    pub item_id: String,
    #[serde(default)]
    pub item_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_priority")]
    pub priority: Priority,
    #[serde(default)]
    pub intake_photos: Vec<String>,
    #[serde(default)]
    pub checkout_photos: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_photos: Option<MissingPhotos>,
    #[serde(default = "default_completeness")]
    pub documentation_completeness: Completeness,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intake_timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout_timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub damage_analysis: Option<DamageAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevance_to_query: Option<ConfidenceTier>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub concerns: Vec<String>,
}

fn default_priority() -> Priority {
    Priority::Low
}

fn default_completeness() -> Completeness {
    Completeness::Missing
}

/// A legal article the extraction stage considered applicable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegalReference {
    pub article: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub relevance: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyFactors {
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub critical_evidence: Vec<String>,
    #[serde(default)]
    pub timeline_facts: Vec<String>,
}

/// Structured output of the extraction stage. Consumed only by the report
/// stage; never persisted on its own.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaseContext {
    #[serde(default)]
    pub case_id: String,
    #[serde(default)]
    pub user_query: String,
    #[serde(default)]
    pub lease_context: LeaseContext,
    #[serde(default)]
    pub evidence_items: Vec<EvidenceItemSummary>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub legal_references: Vec<LegalReference>,
    #[serde(default)]
    pub key_factors: KeyFactors,
}

// ──────────────────────────────────────────────
// Stage 2: DefenseReport
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub date: String,
    pub event: String,
}

/// One ordered block of a defense document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text {
        content: String,
    },
    Heading {
        content: String,
    },
    Comparison {
        item: String,
        before_image: String,
        after_image: String,
        #[serde(default)]
        caption: String,
    },
    Evidence {
        content: String,
        #[serde(default)]
        images: Vec<String>,
    },
    Timeline {
        events: Vec<TimelineEvent>,
    },
    Recommendation {
        content: String,
    },
}

/// The drafted defense document: the raw markdown the model produced plus
/// the ordered blocks derived from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefenseReport {
    pub markdown: String,
    pub blocks: Vec<ContentBlock>,
    /// Legal article tokens cited in the report, in order of appearance.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<String>,
}

// ──────────────────────────────────────────────
// Stage 3: CaseEvaluation
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseStrength {
    Strong,
    Moderate,
    Weak,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepositReturn {
    Full,
    Partial,
    Minimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimatedOutcome {
    pub deposit_return: DepositReturn,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub likely_deduction: Option<String>,
    #[serde(default)]
    pub reasoning: String,
}

/// An evidentiary gap the evaluator found, with how badly it hurts the case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceGap {
    pub item: String,
    #[serde(default = "EvidenceGap::default_severity")]
    pub severity: super::evidence::Severity,
    #[serde(default)]
    pub description: String,
}

impl EvidenceGap {
    fn default_severity() -> super::evidence::Severity {
        super::evidence::Severity::Minor
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextSteps {
    #[serde(default)]
    pub immediate: String,
    #[serde(default)]
    pub if_disputed: String,
    #[serde(default)]
    pub escalation: String,
}

/// Terminal artifact of the pipeline; immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseEvaluation {
    /// 0–100. Unset when the evaluation stage could not run; a missing
    /// probability is honest, a fabricated one is not.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub win_probability: Option<u8>,
    pub confidence: ConfidenceTier,
    #[serde(default)]
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_strength: Option<CaseStrength>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_strength: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_weakness: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_outcome: Option<EstimatedOutcome>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub risk_factors: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidence_gaps: Vec<EvidenceGap>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recommendations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_steps: Option<NextSteps>,
}

impl CaseEvaluation {
    /// Neutral placeholder returned when evaluation fails after a report was
    /// already drafted: probability unset, low confidence, summary truncated
    /// from the report itself.
    pub fn neutral(report: &DefenseReport) -> Self {
        let summary: String = report.markdown.chars().take(200).collect();
        Self {
            win_probability: None,
            confidence: ConfidenceTier::Low,
            summary,
            case_strength: None,
            key_strength: None,
            key_weakness: None,
            estimated_outcome: None,
            risk_factors: vec![],
            evidence_gaps: vec![],
            recommendations: vec![],
            next_steps: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_block_wire_tags() {
        let block = ContentBlock::Comparison {
            item: "Kitchen - Countertop".into(),
            before_image: "https://store/intake/1.jpg".into(),
            after_image: "https://store/checkout/1.jpg".into(),
            caption: "Minor scratches consistent with normal use".into(),
        };
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["type"], "comparison");
        assert_eq!(json["before_image"], "https://store/intake/1.jpg");
    }

    #[test]
    fn case_context_tolerates_sparse_json() {
        let context: CaseContext =
            serde_json::from_str(r#"{"user_query": "deposit deduction"}"#).unwrap();
        assert_eq!(context.user_query, "deposit deduction");
        assert!(context.evidence_items.is_empty());
    }

    #[test]
    fn neutral_evaluation_truncates_report_excerpt() {
        let report = DefenseReport {
            markdown: "# Defense Report\n".repeat(40),
            blocks: vec![],
            citations: vec![],
        };
        let eval = CaseEvaluation::neutral(&report);
        assert!(eval.win_probability.is_none());
        assert_eq!(eval.confidence, ConfidenceTier::Low);
        assert_eq!(eval.summary.chars().count(), 200);
    }

    #[test]
    fn evaluation_omits_unset_probability() {
        let report = DefenseReport {
            markdown: "# R".into(),
            blocks: vec![],
            citations: vec![],
        };
        let json = serde_json::to_string(&CaseEvaluation::neutral(&report)).unwrap();
        assert!(!json.contains("win_probability"));
        assert!(!json.contains("null"));
    }
}

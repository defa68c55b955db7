//! Lease contract data as produced by contract analysis.
//!
//! Everything here is model-authored at least once, so every field that the
//! model may omit is optional and every optional is skipped on serialization
//! (the persistence collaborator rejects explicit nulls).

use serde::{Deserialize, Serialize};

/// What kind of asset the lease covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetType {
    Car,
    Motorbike,
    Property,
}

impl std::fmt::Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Car => write!(f, "Car"),
            Self::Motorbike => write!(f, "Motorbike"),
            Self::Property => write!(f, "Property"),
        }
    }
}

/// Legal standing of a single contract clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClauseStatus {
    /// Complies with the Code of Obligations, fair to the tenant.
    Clean,
    /// Potentially unfavorable but legal.
    Warning,
    /// May violate tenant rights; needs legal review.
    Risk,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clause {
    pub section: String,
    pub text: String,
    pub status: ClauseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legal_reference: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IrregularitySeverity {
    Minor,
    Moderate,
    Severe,
}

/// A contract term flagged as potentially abusive or illegal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Irregularity {
    pub issue: String,
    pub severity: IrregularitySeverity,
    pub legal_basis: String,
    /// Exact text from the lease where the issue was found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clause_text: Option<String>,
    /// Where in the document (e.g. "Section 5, Paragraph 2").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BenchmarkVerdict {
    Better,
    Standard,
    Worse,
}

/// How the contract compares against a standard lease for the asset type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Benchmark {
    pub compared_to_standard: BenchmarkVerdict,
    #[serde(default)]
    pub key_differences: Vec<String>,
    #[serde(default)]
    pub tenant_advantages: Vec<String>,
    #[serde(default)]
    pub tenant_disadvantages: Vec<String>,
}

/// One label/value row of extracted lease facts (price, dates, deposit, …).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfoItem {
    pub label: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Responsibilities {
    #[serde(default)]
    pub tenant: Vec<String>,
    #[serde(default)]
    pub lessor: Vec<String>,
}

/// Documentation priority of an inspection item.
///
/// High priority maps to areas named in damage/liability clauses, medium to
/// standard wear areas the contract mentions, low to general condition items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// One entry of the photographic inspection checklist.
///
/// Created during contract analysis and immutable thereafter; the evidence
/// ledger keys its records by `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectionItem {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub photo_angles: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended_photos: Option<u32>,
    #[serde(default = "Priority::default_low")]
    pub priority: Priority,
    /// Why this item matters, tied to a contract clause.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_reference: Option<String>,
}

impl Priority {
    fn default_low() -> Self {
        Priority::Low
    }
}

/// Structured lease contract data, the foundation of every pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaseData {
    #[serde(default)]
    pub title: String,
    pub asset_type: AssetType,
    #[serde(default)]
    pub asset_name: String,
    /// 0 (harmless) to 100 (hostile to the tenant).
    #[serde(default)]
    pub risk_score: u8,
    #[serde(default)]
    pub inspection_items: Vec<InspectionItem>,
    #[serde(default)]
    pub clauses: Vec<Clause>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub irregularities: Vec<Irregularity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benchmark: Option<Benchmark>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recommendations: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub info: Vec<InfoItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responsibilities: Option<Responsibilities>,
    /// Lease start date, ISO 8601, when the contract states one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

impl LeaseData {
    pub fn item(&self, item_id: &str) -> Option<&InspectionItem> {
        self.inspection_items.iter().find(|i| i.id == item_id)
    }
}

/// Tenant identity passed through to prompts; never required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TenantInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clause_status_uses_lowercase_wire_form() {
        let json = serde_json::to_string(&ClauseStatus::Risk).unwrap();
        assert_eq!(json, "\"risk\"");
        let back: ClauseStatus = serde_json::from_str("\"warning\"").unwrap();
        assert_eq!(back, ClauseStatus::Warning);
    }

    #[test]
    fn inspection_item_defaults_to_low_priority() {
        let item: InspectionItem = serde_json::from_str(
            r#"{"id": "kitchen_counter", "name": "Kitchen Countertops", "description": "Photo all surfaces"}"#,
        )
        .unwrap();
        assert_eq!(item.priority, Priority::Low);
        assert!(item.photo_angles.is_empty());
    }

    #[test]
    fn lease_data_omits_unset_optionals() {
        let lease = LeaseData {
            title: "Apartment in Vaud".into(),
            asset_type: AssetType::Property,
            asset_name: "Rue de la Paix 10".into(),
            risk_score: 45,
            inspection_items: vec![],
            clauses: vec![],
            irregularities: vec![],
            benchmark: None,
            recommendations: vec![],
            info: vec![],
            responsibilities: None,
            start_date: None,
            end_date: None,
        };
        let json = serde_json::to_string(&lease).unwrap();
        assert!(!json.contains("null"));
        assert!(!json.contains("benchmark"));
        assert!(!json.contains("start_date"));
    }

    #[test]
    fn item_lookup_by_id() {
        let lease = LeaseData {
            title: String::new(),
            asset_type: AssetType::Car,
            asset_name: "VW Golf".into(),
            risk_score: 30,
            inspection_items: vec![InspectionItem {
                id: "front_bumper".into(),
                name: "Front Bumper".into(),
                room: None,
                description: "All angles".into(),
                photo_angles: vec![],
                recommended_photos: Some(2),
                priority: Priority::High,
                reason: None,
                contract_reference: None,
            }],
            clauses: vec![],
            irregularities: vec![],
            benchmark: None,
            recommendations: vec![],
            info: vec![],
            responsibilities: None,
            start_date: None,
            end_date: None,
        };
        assert!(lease.item("front_bumper").is_some());
        assert!(lease.item("rear_bumper").is_none());
    }
}

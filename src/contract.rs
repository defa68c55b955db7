//! Lease contract analysis: document text → structured [`LeaseData`].
//!
//! This is the one component whose deterministic fallback is a full domain
//! object rather than a neutral sentinel: with no usable model output the
//! tenant still gets a standard clause assessment and a generic inspection
//! checklist to photograph against.

use thiserror::Error;

use crate::composer::{contract_analysis_prompts, LegalRubric};
use crate::gateway::{ChatMessage, ChatModel, GenerateOptions};
use crate::models::{
    AssetType, Benchmark, BenchmarkVerdict, Clause, ClauseStatus, InspectionItem, Irregularity,
    IrregularitySeverity, LeaseData, Priority, TenantInfo,
};
use crate::recovery::{self, parse_array_lenient};

/// Minimum document length worth sending to the model (characters).
const MIN_DOCUMENT_LENGTH: usize = 40;

#[derive(Error, Debug)]
pub enum ContractError {
    #[error("document text too short for analysis (< {MIN_DOCUMENT_LENGTH} characters)")]
    InputTooShort,
}

pub struct ContractAnalyzer<'a, C: ChatModel> {
    client: &'a C,
    rubric: &'a LegalRubric,
}

impl<'a, C: ChatModel> ContractAnalyzer<'a, C> {
    pub fn new(client: &'a C, rubric: &'a LegalRubric) -> Self {
        Self { client, rubric }
    }

    /// Analyze extracted lease text for the given jurisdiction.
    pub fn analyze(
        &self,
        document_text: &str,
        jurisdiction: &str,
        tenant: Option<&TenantInfo>,
    ) -> Result<LeaseData, ContractError> {
        if document_text.trim().len() < MIN_DOCUMENT_LENGTH {
            return Err(ContractError::InputTooShort);
        }

        let prompts =
            contract_analysis_prompts(self.rubric, jurisdiction, document_text, tenant);
        let messages = vec![
            ChatMessage::system(prompts.system),
            ChatMessage::user(prompts.user),
        ];

        let raw = match self.client.generate(&messages, &GenerateOptions::extraction()) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "contract analysis call failed — using standard assessment");
                return Ok(fallback_lease(jurisdiction));
            }
        };

        match recovery::recover_value(&raw) {
            Ok(value) => Ok(lease_from_value(value, jurisdiction)),
            Err(e) => {
                tracing::warn!(error = %e, "contract analysis unparseable — using standard assessment");
                Ok(fallback_lease(jurisdiction))
            }
        }
    }
}

/// Build LeaseData field-wise so one malformed array entry does not discard
/// the whole analysis.
fn lease_from_value(value: serde_json::Value, jurisdiction: &str) -> LeaseData {
    let asset_type = value
        .get("asset_type")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or(AssetType::Property);

    let string_of = |key: &str| {
        value
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::to_string)
    };

    let inspection_items: Vec<InspectionItem> =
        parse_array_lenient(value.get("inspection_items"));
    let clauses: Vec<Clause> = parse_array_lenient(value.get("clauses"));

    if inspection_items.is_empty() && clauses.is_empty() {
        tracing::warn!("contract analysis produced no clauses or items — using standard assessment");
        return fallback_lease(jurisdiction);
    }

    LeaseData {
        title: string_of("title").unwrap_or_else(|| "Lease agreement".to_string()),
        asset_type,
        asset_name: string_of("asset_name").unwrap_or_default(),
        risk_score: value
            .get("risk_score")
            .and_then(|v| v.as_u64())
            .map(|v| v.min(100) as u8)
            .unwrap_or(50),
        inspection_items,
        clauses,
        irregularities: parse_array_lenient(value.get("irregularities")),
        benchmark: value
            .get("benchmark")
            .and_then(|v| serde_json::from_value(v.clone()).ok()),
        recommendations: parse_array_lenient(value.get("recommendations")),
        info: parse_array_lenient(value.get("info")),
        responsibilities: value
            .get("responsibilities")
            .and_then(|v| serde_json::from_value(v.clone()).ok()),
        start_date: string_of("start_date"),
        end_date: string_of("end_date"),
    }
}

/// The standard assessment used when the model yields nothing usable.
fn fallback_lease(jurisdiction: &str) -> LeaseData {
    LeaseData {
        title: "Lease agreement (standard assessment)".to_string(),
        asset_type: AssetType::Property,
        asset_name: "Residential apartment".to_string(),
        risk_score: 45,
        inspection_items: standard_inspection_items(),
        clauses: vec![
            Clause {
                section: "Term".into(),
                text: "12 months fixed duration.".into(),
                status: ClauseStatus::Clean,
                note: None,
                legal_reference: Some("Art. 266a CO".into()),
            },
            Clause {
                section: "Deposit".into(),
                text: "3 months rent deposit.".into(),
                status: ClauseStatus::Warning,
                note: Some(format!("Standard practice in {jurisdiction}")),
                legal_reference: Some("Art. 257e CO".into()),
            },
            Clause {
                section: "Damage".into(),
                text: "Tenant liable for all damages.".into(),
                status: ClauseStatus::Risk,
                note: Some(format!(
                    "Potentially unfair under {jurisdiction} law — tenant is only liable \
                     for damage beyond normal wear and tear"
                )),
                legal_reference: Some("Art. 267 CO".into()),
            },
        ],
        irregularities: vec![Irregularity {
            issue: "Excessive damage liability clause".into(),
            severity: IrregularitySeverity::Moderate,
            legal_basis: "Under Art. 267 CO, tenants are only liable for damages beyond \
                          normal wear and tear"
                .into(),
            clause_text: None,
            location: None,
        }],
        benchmark: Some(Benchmark {
            compared_to_standard: BenchmarkVerdict::Worse,
            key_differences: vec![
                "Overly broad damage liability".into(),
                "No mention of normal wear and tear".into(),
            ],
            tenant_advantages: vec!["Standard deposit amount".into()],
            tenant_disadvantages: vec!["Excessive damage liability".into()],
        }),
        recommendations: vec![
            "Request clarification on the normal wear and tear definition".into(),
            "Ensure the deposit is held in a blocked account".into(),
            "Document all pre-existing conditions thoroughly".into(),
        ],
        info: vec![],
        responsibilities: None,
        start_date: None,
        end_date: None,
    }
}

fn standard_inspection_items() -> Vec<InspectionItem> {
    let item = |id: &str, name: &str, room: &str, description: &str, angles: &[&str], priority: Priority, reason: &str| {
        InspectionItem {
            id: id.into(),
            name: name.into(),
            room: Some(room.into()),
            description: description.into(),
            photo_angles: angles.iter().map(|a| a.to_string()).collect(),
            recommended_photos: Some(angles.len() as u32),
            priority,
            reason: Some(reason.into()),
            contract_reference: Some("Damage liability clause".into()),
        }
    };
    vec![
        item(
            "kitchen_counter",
            "Kitchen - Countertops",
            "Kitchen",
            "Photograph countertops from multiple angles",
            &["Overall view", "Close-up of any marks", "Sink area"],
            Priority::High,
            "Stains and scratches often disputed",
        ),
        item(
            "kitchen_appliances",
            "Kitchen - Appliances",
            "Kitchen",
            "Document stove, oven and refrigerator condition",
            &["Front view", "Interior", "Control panels"],
            Priority::High,
            "High-value items",
        ),
        item(
            "bathroom_tiles",
            "Bathroom - Tiles & Grout",
            "Bathroom",
            "Check tiles, grout and caulking",
            &["Wall tiles", "Floor tiles", "Shower area"],
            Priority::High,
            "Water damage claims common",
        ),
        item(
            "living_walls",
            "Living Room - Walls",
            "Living Room",
            "All walls for paint, holes and marks",
            &["Each wall", "Corners"],
            Priority::High,
            "Paint damage most disputed",
        ),
        item(
            "living_floor",
            "Living Room - Flooring",
            "Living Room",
            "Parquet, carpet or tile condition",
            &["Overall floor", "High-traffic areas"],
            Priority::Medium,
            "Wear patterns must be documented",
        ),
        item(
            "bedroom_walls",
            "Bedroom - Walls",
            "Bedroom",
            "All bedroom walls and ceiling",
            &["Each wall", "Ceiling"],
            Priority::Medium,
            "Pre-existing marks protection",
        ),
        item(
            "windows_doors",
            "Windows and Doors",
            "All Rooms",
            "All windows, frames and doors",
            &["Each window", "Each door", "Locks"],
            Priority::Medium,
            "Frame and lock condition",
        ),
        item(
            "entrance",
            "Entrance Area",
            "Entrance",
            "Entry door, walls and floor",
            &["Entry door both sides", "Floor"],
            Priority::Low,
            "High-traffic area",
        ),
    ]
}

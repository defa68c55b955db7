//! The legal rubric as structured, versioned configuration.
//!
//! Prompts used to embed the article catalogue and scoring rules as inline
//! string literals; rule changes then meant touching orchestration code. The
//! rubric is now data: the default instance carries the Swiss Code of
//! Obligations catalogue, and a deployment can load a revised rubric from
//! JSON without rebuilding.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::AssetType;

#[derive(Error, Debug)]
pub enum RubricError {
    #[error("cannot read rubric file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid rubric JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One catalogued legal article: the citable token plus what it covers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegalArticle {
    pub token: String,
    pub topic: String,
}

/// Normal-wear examples for one asset type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WearProfile {
    pub asset_type: AssetType,
    pub qualifier: String,
    pub examples: Vec<String>,
}

/// Domain/legal boilerplate injected into every prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegalRubric {
    pub version: String,
    /// Lead paragraph establishing the legal frame; `{jurisdiction}` is
    /// substituted with the lease's canton.
    pub preamble: String,
    pub articles: Vec<LegalArticle>,
    pub wear_profiles: Vec<WearProfile>,
    /// Evidence-based win probability rules, strongest first.
    pub scoring_rules: Vec<String>,
    /// Contract terms that must be flagged as irregular.
    pub irregularity_flags: Vec<String>,
}

impl LegalRubric {
    /// Load a revised rubric from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, RubricError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn preamble_for(&self, jurisdiction: &str) -> String {
        self.preamble.replace("{jurisdiction}", jurisdiction)
    }

    /// The article catalogue as prompt lines.
    pub fn catalogue_section(&self) -> String {
        let mut out = String::from("APPLICABLE LAW (cite as written):\n");
        for article in &self.articles {
            out.push_str(&format!("- {}: {}\n", article.token, article.topic));
        }
        out
    }

    pub fn wear_section(&self) -> String {
        let mut out = String::from("NORMAL WEAR BY ASSET TYPE (never chargeable):\n");
        for profile in &self.wear_profiles {
            out.push_str(&format!(
                "- {} ({}): {}\n",
                profile.asset_type,
                profile.qualifier,
                profile.examples.join(", ")
            ));
        }
        out
    }

    pub fn scoring_section(&self) -> String {
        let mut out = String::from(
            "WIN PROBABILITY RULES (evidence-based, never assign HIGH without \
             complete photographic evidence of both states):\n",
        );
        for rule in &self.scoring_rules {
            out.push_str(&format!("- {rule}\n"));
        }
        out
    }

    pub fn irregularity_section(&self) -> String {
        let mut out = String::from("IRREGULARITIES TO FLAG:\n");
        for flag in &self.irregularity_flags {
            out.push_str(&format!("- {flag}\n"));
        }
        out
    }
}

impl Default for LegalRubric {
    /// The Swiss Code of Obligations rubric (Art. 253–274g CO).
    fn default() -> Self {
        Self {
            version: "co-2024.1".to_string(),
            preamble: "Swiss rental law (Code of Obligations Art. 253-274g CO) governs all \
                       lease agreements: property, vehicles and equipment alike. This lease is \
                       governed by {jurisdiction} cantonal law; apply canton-specific tenant \
                       protections where applicable. The landlord bears the burden of proof \
                       for damage claims beyond normal wear; the tenant proves pre-existing \
                       conditions through intake photos."
                .to_string(),
            articles: vec![
                article("Art. 253 CO", "Definition of the rental agreement (any leased item)"),
                article("Art. 256 CO", "Handover of the leased item"),
                article("Art. 256a CO", "Defects upon handover"),
                article("Art. 257 CO", "Lessee's duty of care and maintenance"),
                article("Art. 257a CO", "Duty to notify defects"),
                article("Art. 257d CO", "Liability for damage"),
                article("Art. 257e CO", "Security deposit — maximum 3 months rent for property"),
                article("Art. 258 CO", "Lessor's duty to maintain the leased item"),
                article("Art. 259 CO", "Lessor's duty to perform repairs"),
                article("Art. 259a CO", "Lessee remedies for defects"),
                article("Art. 259b CO", "Rent reduction for defects"),
                article("Art. 266a CO", "Notice periods for termination"),
                article("Art. 266c CO", "Written form of termination"),
                article("Art. 266g CO", "Termination for urgent reasons"),
                article("Art. 267 CO", "Return condition — no liability for normal wear and tear"),
                article("Art. 267a CO", "Modifications by the lessee"),
                article("Art. 268 CO", "Condition upon return"),
                article("Art. 268a CO", "Mandatory inspection upon return"),
                article("Art. 268b CO", "Prompt notification of defects or loss of claim"),
                article("Art. 269 CO", "Initial rent determination"),
                article("Art. 269a CO", "Abusive pricing"),
                article("Art. 271 CO", "Protection against abusive termination"),
                article("Art. 272 CO", "Extension of the lease"),
                article("Art. 274 CO", "Mandatory conciliation before court (free of charge)"),
            ],
            wear_profiles: vec![
                WearProfile {
                    asset_type: AssetType::Property,
                    qualifier: "3+ years".to_string(),
                    examples: vec![
                        "faded paint".into(),
                        "worn carpet".into(),
                        "minor wall marks".into(),
                        "loose fixtures".into(),
                    ],
                },
                WearProfile {
                    asset_type: AssetType::Car,
                    qualifier: "20,000+ km".to_string(),
                    examples: vec![
                        "tire wear".into(),
                        "minor scratches".into(),
                        "interior wear".into(),
                        "small dents".into(),
                    ],
                },
                WearProfile {
                    asset_type: AssetType::Motorbike,
                    qualifier: "seasonal use".to_string(),
                    examples: vec![
                        "surface scratches".into(),
                        "worn edges".into(),
                        "usage marks".into(),
                        "minor scuffs".into(),
                    ],
                },
            ],
            scoring_rules: vec![
                "HIGH only when both intake AND checkout photos exist for the claimed item, \
                 photos show no damage or only normal wear, and the legal basis is strong"
                    .into(),
                "MEDIUM when evidence exists but is incomplete, or photos do not directly \
                 address the specific claim"
                    .into(),
                "LOW when no photographic evidence exists for the claimed item, or the \
                 evidence supports the landlord's claim"
                    .into(),
                "No checkout photos: state 'INSUFFICIENT EVIDENCE — no checkout \
                 documentation'; probability MEDIUM at best"
                    .into(),
                "No intake photos: baseline unprovable; reduce to MEDIUM".into(),
                "No photos at all: state 'CRITICAL EVIDENCE GAP'; probability LOW".into(),
            ],
            irregularity_flags: vec![
                "Deposit above 3 months rent (property) or disproportionate (vehicles, \
                 equipment)"
                    .into(),
                "Clauses making the tenant liable for normal wear (illegal under Art. 267 CO)"
                    .into(),
                "Unfair termination clauses violating Art. 271 CO".into(),
                "Missing inspection protocols (Art. 268a CO)".into(),
                "Excessive liability for minor damage".into(),
            ],
        }
    }
}

fn article(token: &str, topic: &str) -> LegalArticle {
    LegalArticle {
        token: token.to_string(),
        topic: topic.to_string(),
    }
}

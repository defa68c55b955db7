//! Single-shot defense claim analysis.
//!
//! The three-stage pipeline drafts a full dossier; this path answers one
//! specific landlord claim in a single vision call and returns the
//! block-structured result directly. Used for quick "the landlord says X -
//! do I fight it?" questions without waiting for a complete report.

use serde::{Deserialize, Serialize};

use crate::composer::{prompts::evidence_section, LegalRubric};
use crate::gateway::{ChatMessage, ChatModel, ContentPart, GenerateOptions};
use crate::ledger::EvidenceLedger;
use crate::models::{ConfidenceTier, ContentBlock, LeaseData};
use crate::recovery::{self, parse_array_lenient};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ClaimAction {
    Fight,
    Negotiate,
    Accept,
}

/// Block-structured answer to one claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimDossier {
    pub recommendation: ClaimAction,
    pub win_probability: ConfidenceTier,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub legal_references: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub action_steps: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<String>,
}

/// Analyze one landlord claim (or run a general review when `claim` is None)
/// against all documented evidence.
pub fn analyze_claim<C: ChatModel>(
    client: &C,
    rubric: &LegalRubric,
    jurisdiction: &str,
    lease: &LeaseData,
    ledger: &EvidenceLedger,
    claim: Option<&str>,
) -> ClaimDossier {
    let evidence = ledger.snapshot();

    let mut system = String::new();
    system.push_str(
        "You are a leading Swiss rental law attorney creating a professional legal \
         defense document suitable for a rental tribunal or landlord negotiation.\n\n",
    );
    system.push_str(&rubric.preamble_for(jurisdiction));
    system.push_str("\n\n");
    system.push_str(&rubric.catalogue_section());
    system.push('\n');
    system.push_str(&rubric.scoring_section());
    system.push_str("\n=== LEASE INFORMATION ===\n");
    system.push_str(
        &serde_json::to_string_pretty(lease).unwrap_or_else(|_| "{}".to_string()),
    );
    system.push('\n');
    system.push_str(&evidence_section(&evidence));
    system.push_str(
        "\nOUTPUT FORMAT (STRICT JSON, no markdown, exact field set):\n\
         {\n\
           \"recommendation\": \"FIGHT\" | \"NEGOTIATE\" | \"ACCEPT\",\n\
           \"win_probability\": \"high\" | \"medium\" | \"low\",\n\
           \"summary\": \"2-3 sentence executive summary; MUST mention evidence gaps if any exist\",\n\
           \"content\": [\n\
             {\"type\": \"heading\", \"content\": \"...\"},\n\
             {\"type\": \"text\", \"content\": \"...\"},\n\
             {\"type\": \"comparison\", \"item\": \"...\", \"before_image\": \"EXACT intake URL\", \"after_image\": \"EXACT checkout URL\", \"caption\": \"...\"},\n\
             {\"type\": \"evidence\", \"content\": \"...\", \"images\": [\"exact urls\"]},\n\
             {\"type\": \"timeline\", \"events\": [{\"date\": \"YYYY-MM-DD\", \"event\": \"...\"}]},\n\
             {\"type\": \"recommendation\", \"content\": \"...\"}\n\
           ],\n\
           \"legal_references\": [\"Art. 267 CO — ...\"],\n\
           \"action_steps\": [\"...\"],\n\
           \"estimated_cost\": \"CHF 0-500\" | \"CHF 500-2000\" | \"CHF 2000+\"\n\
         }\n\n\
         Use the EXACT photo URLs from the evidence; include comparison blocks only \
         where photos directly support the argument. Where evidence is missing, say \
         'INSUFFICIENT EVIDENCE' and state what documentation should be gathered.\n",
    );

    let query = match claim {
        Some(claim) if !claim.trim().is_empty() => format!(
            "SPECIFIC CLAIM TO ANALYZE:\n{claim}\n\nFocus the analysis on this claim: \
             does evidence exist for the claimed item, what does it show, what is the \
             legal assessment, and what is the recommended action?"
        ),
        _ => "Conduct a comprehensive legal defense analysis of ALL documented \
              evidence. Review each item, assess tenant liability, and provide \
              strategic recommendations."
            .to_string(),
    };

    let mut parts = vec![ContentPart::text(query)];
    for url in ledger.all_photo_refs() {
        parts.push(ContentPart::image(url));
    }
    let messages = vec![
        ChatMessage::system(system),
        ChatMessage::user_parts(parts),
    ];

    let raw = match client.generate(&messages, &GenerateOptions::drafting()) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(error = %e, "claim analysis call failed");
            return degraded_dossier("Claim analysis unavailable — the model could not be reached.");
        }
    };

    match recovery::recover_value(&raw) {
        Ok(value) => dossier_from_value(value, &raw),
        Err(e) => {
            tracing::warn!(error = %e, "claim analysis unparseable — degrading to text dossier");
            degraded_dossier(&raw)
        }
    }
}

fn dossier_from_value(value: serde_json::Value, raw: &str) -> ClaimDossier {
    let recommendation = value
        .get("recommendation")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or(ClaimAction::Negotiate);
    let win_probability = value
        .get("win_probability")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or(ConfidenceTier::Medium);
    let summary = value
        .get("summary")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| raw.chars().take(200).collect());

    let content: Vec<ContentBlock> = parse_array_lenient(value.get("content"));
    let content = if content.is_empty() {
        vec![ContentBlock::Text {
            content: summary.clone(),
        }]
    } else {
        content
    };

    ClaimDossier {
        recommendation,
        win_probability,
        summary,
        content,
        legal_references: parse_array_lenient(value.get("legal_references")),
        action_steps: parse_array_lenient(value.get("action_steps")),
        estimated_cost: value
            .get("estimated_cost")
            .and_then(|v| v.as_str())
            .map(str::to_string),
    }
}

/// When the response cannot be structured at all, the raw text becomes a
/// single text block under a neutral NEGOTIATE stance.
fn degraded_dossier(raw: &str) -> ClaimDossier {
    ClaimDossier {
        recommendation: ClaimAction::Negotiate,
        win_probability: ConfidenceTier::Medium,
        summary: raw.chars().take(200).collect(),
        content: vec![ContentBlock::Text {
            content: raw.to_string(),
        }],
        legal_references: vec![],
        action_steps: vec![],
        estimated_cost: None,
    }
}

//! Stage prompt assembly.
//!
//! Every builder produces a fixed legal preamble (from the rubric) plus the
//! dynamic payload, and always states the exact output field set expected
//! back; the recovery engine's repair heuristics assume the JSON object is
//! the dominant content of the response, so the schema description is never
//! omitted.

use chrono::Duration;

use crate::ledger::ItemEvidence;
use crate::models::{LeaseData, TenantInfo, TimelineEvent};

use super::rubric::LegalRubric;

/// A system/user prompt pair for one model call.
#[derive(Debug, Clone)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

/// Section markers the drafted report must contain to count as valid.
pub const REPORT_SECTION_MARKERS: &[&str] = &[
    "# Defense Report",
    "## Executive Summary",
    "## Evidence Analysis",
    "## Legal Assessment",
    "## Conclusion",
];

// ──────────────────────────────────────────────
// Contract analysis
// ──────────────────────────────────────────────

pub fn contract_analysis_prompts(
    rubric: &LegalRubric,
    jurisdiction: &str,
    document_text: &str,
    tenant: Option<&TenantInfo>,
) -> PromptPair {
    let mut system = String::new();
    system.push_str(
        "You are an expert Swiss rental law analyst specializing in tenant protection.\n\n",
    );
    system.push_str(&rubric.preamble_for(jurisdiction));
    system.push_str("\n\n");
    system.push_str(&rubric.catalogue_section());
    system.push('\n');
    system.push_str(&rubric.wear_section());
    system.push('\n');
    system.push_str(&rubric.irregularity_section());
    system.push_str(
        "\nCLAUSE ANALYSIS STANDARDS:\n\
         - \"clean\": complies with the Code of Obligations, fair to the tenant\n\
         - \"warning\": potentially unfavorable but legal\n\
         - \"risk\": may violate tenant rights, needs legal review\n\n\
         TASKS:\n\
         1. Identify the asset type: Car, Motorbike, or Property\n\
         2. Extract all lease facts as info rows (only facts actually in the document)\n\
         3. Analyze the most important clauses (5-15 depending on contract length)\n\
         4. Flag every irregular term with its legal basis\n\
         5. Generate 8-15 inspection items, prioritized by the contract's own\n\
            damage and liability clauses, each with photo angles and a reason\n\
            referencing the clause that makes it matter\n\
         6. Benchmark the contract against a standard lease\n\n",
    );
    system.push_str(
        "CRITICAL: Respond with ONLY valid JSON. No markdown, no explanations.\n\
         Keep strings under 100 characters, no quotes inside strings, no newlines\n\
         inside strings, no trailing commas.\n\n\
         JSON structure (exact field set):\n\
         {\n\
           \"title\": \"...\",\n\
           \"asset_type\": \"Car\" | \"Motorbike\" | \"Property\",\n\
           \"asset_name\": \"...\",\n\
           \"risk_score\": 0-100,\n\
           \"info\": [{\"label\": \"Price\", \"value\": \"CHF 1500\", \"icon\": \"money\"}],\n\
           \"responsibilities\": {\"tenant\": [\"...\"], \"lessor\": [\"...\"]},\n\
           \"clauses\": [{\"section\": \"...\", \"text\": \"...\", \"status\": \"clean\"|\"warning\"|\"risk\", \"note\": \"...\", \"legal_reference\": \"Art. 257e CO\"}],\n\
           \"irregularities\": [{\"issue\": \"...\", \"severity\": \"minor\"|\"moderate\"|\"severe\", \"legal_basis\": \"...\", \"clause_text\": \"...\", \"location\": \"...\"}],\n\
           \"inspection_items\": [{\"id\": \"kitchen_counter\", \"name\": \"...\", \"room\": \"...\", \"description\": \"...\", \"photo_angles\": [\"...\"], \"recommended_photos\": 3, \"priority\": \"high\"|\"medium\"|\"low\", \"reason\": \"...\", \"contract_reference\": \"...\"}],\n\
           \"benchmark\": {\"compared_to_standard\": \"better\"|\"standard\"|\"worse\", \"key_differences\": [\"...\"], \"tenant_advantages\": [\"...\"], \"tenant_disadvantages\": [\"...\"]},\n\
           \"recommendations\": [\"...\"],\n\
           \"start_date\": \"YYYY-MM-DD\",\n\
           \"end_date\": \"YYYY-MM-DD\"\n\
         }\n",
    );

    let mut user = format!("Analyze this lease agreement for {jurisdiction}.\n\n");
    if let Some(tenant) = tenant {
        user.push_str(&tenant_block(tenant));
    }
    user.push_str("Document text:\n");
    user.push_str(document_text);
    user.push_str("\n\nReturn ONLY valid JSON with the structure shown in the system instructions.");

    PromptPair { system, user }
}

// ──────────────────────────────────────────────
// Stage 1: context extraction
// ──────────────────────────────────────────────

pub fn context_extraction_prompts(
    rubric: &LegalRubric,
    jurisdiction: &str,
    lease: &LeaseData,
    evidence: &[ItemEvidence],
    user_query: &str,
    tenant: Option<&TenantInfo>,
) -> PromptPair {
    let mut system = String::new();
    system.push_str(
        "You are an expert legal case preparation specialist. Extract, organize and \
         structure ALL relevant information for a tenant defense case.\n\n",
    );
    system.push_str(&rubric.preamble_for(jurisdiction));
    system.push_str("\n\n");
    system.push_str(&rubric.catalogue_section());
    system.push('\n');
    system.push_str(
        "EXTRACTION REQUIREMENTS:\n\
         - Preserve ALL photo URLs exactly as provided, never paraphrase them\n\
         - Include complete clause texts, not summaries\n\
         - For EACH inspection item: count intake vs checkout photos, flag what is\n\
           missing, and mark documentation_completeness as complete, partial or missing\n\
         - Missing photos severely weaken a defense; document every gap\n\
         - Assess each item's relevance to the user query (high, medium, low)\n\n",
    );
    system.push_str(
        "OUTPUT FORMAT (JSON only, no markdown, exact field set):\n\
         {\n\
           \"case_id\": \"CASE-...\",\n\
           \"user_query\": \"...\",\n\
           \"lease_context\": {\n\
             \"asset_type\": \"...\", \"asset_name\": \"...\", \"risk_score\": 0-100,\n\
             \"info\": [{\"label\": \"...\", \"value\": \"...\"}],\n\
             \"clauses\": [{\"section\": \"...\", \"text\": \"...\", \"status\": \"clean\"|\"warning\"|\"risk\", \"note\": \"...\", \"legal_reference\": \"...\"}],\n\
             \"responsibilities\": {\"tenant\": [\"...\"], \"lessor\": [\"...\"]},\n\
             \"irregularities\": [{\"issue\": \"...\", \"severity\": \"minor\"|\"moderate\"|\"severe\", \"legal_basis\": \"...\"}]\n\
           },\n\
           \"evidence_items\": [{\n\
             \"item_id\": \"...\", \"item_name\": \"...\", \"description\": \"...\",\n\
             \"priority\": \"high\"|\"medium\"|\"low\",\n\
             \"intake_photos\": [\"exact-url\"], \"checkout_photos\": [\"exact-url\"],\n\
             \"missing_photos\": {\"intake_missing\": false, \"checkout_missing\": false, \"details\": \"...\"},\n\
             \"documentation_completeness\": \"complete\"|\"partial\"|\"missing\",\n\
             \"intake_timestamp\": \"ISO date\", \"checkout_timestamp\": \"ISO date\",\n\
             \"damage_analysis\": {\"has_damage\": bool, \"severity\": \"none\"|\"minor\"|\"moderate\"|\"major\", \"description\": \"...\", \"is_normal_wear\": bool, \"tenant_liable\": bool},\n\
             \"relevance_to_query\": \"high\"|\"medium\"|\"low\",\n\
             \"concerns\": [\"...\"]\n\
           }],\n\
           \"legal_references\": [{\"article\": \"Art. 267 CO\", \"topic\": \"...\", \"relevance\": \"...\"}],\n\
           \"key_factors\": {\"strengths\": [\"...\"], \"weaknesses\": [\"...\"], \"critical_evidence\": [\"...\"], \"timeline_facts\": [\"...\"]}\n\
         }\n",
    );

    let mut user = format!("User Query: \"{user_query}\"\n\n");
    if let Some(tenant) = tenant {
        user.push_str(&tenant_block(tenant));
    }
    user.push_str("Lease Data:\n");
    user.push_str(&to_pretty_json(lease));
    user.push_str("\n\n");
    user.push_str(&evidence_section(evidence));
    user.push_str("\nExtract and structure all relevant information for the defense case.");

    PromptPair { system, user }
}

// ──────────────────────────────────────────────
// Stage 2: report drafting
// ──────────────────────────────────────────────

pub fn report_prompts(
    rubric: &LegalRubric,
    jurisdiction: &str,
    context_json: &str,
    user_query: &str,
    timeline: &[TimelineEvent],
) -> PromptPair {
    let mut system = String::new();
    system.push_str(
        "You are a senior Swiss rental law attorney specializing in deposit disputes, \
         damage assessments and normal wear determinations. Generate a comprehensive, \
         legally sound defense report from the structured case context and the \
         attached photos.\n\n",
    );
    system.push_str(&rubric.preamble_for(jurisdiction));
    system.push_str("\n\n");
    system.push_str(&rubric.catalogue_section());
    system.push('\n');
    system.push_str(&rubric.wear_section());
    system.push('\n');
    system.push_str(&rubric.scoring_section());
    system.push_str("\nREPORT STRUCTURE (markdown, these headings are mandatory):\n");
    for marker in REPORT_SECTION_MARKERS {
        system.push_str(marker);
        system.push('\n');
    }
    system.push_str(
        "\nAlso include \"## Timeline of Events\" and \"## Defense Strategy\" sections.\n\
         For every item that has both photo sets, include the photo pair as two lines:\n\
         Before: <exact intake URL>\n\
         After: <exact checkout URL>\n\
         followed by one caption line analyzing the pair.\n\n\
         REQUIREMENTS:\n\
         - USE ACTUAL IMAGE URLS from the case context, never placeholders\n\
         - Flag items with incomplete documentation and state the impact on the case\n\
         - Wrap every law citation in ** markers: **Art. 267 CO**, **OR Art. 259b**\n\
         - State 'INSUFFICIENT EVIDENCE' explicitly where documentation is missing\n\
         - Support every conclusion with evidence or a legal basis\n",
    );

    let mut user = String::from("Case Context:\n");
    user.push_str(context_json);
    user.push_str("\n\n");
    if !timeline.is_empty() {
        user.push_str("TIMELINE OF EVENTS (actual capture timestamps, use them verbatim):\n");
        for event in timeline {
            user.push_str(&format!("- {} — {}\n", event.date, event.event));
        }
        user.push('\n');
    }
    user.push_str(&format!("Tenant's concern: \"{user_query}\"\n\n"));
    user.push_str("Analyze ALL provided images and generate the defense report.");

    PromptPair { system, user }
}

// ──────────────────────────────────────────────
// Stage 3: case evaluation
// ──────────────────────────────────────────────

pub fn evaluation_prompts(rubric: &LegalRubric, report_markdown: &str) -> PromptPair {
    let mut system = String::new();
    system.push_str(
        "You are a senior legal strategist who predicts Swiss rental case outcomes \
         from evidence quality and legal merit. Evaluate the defense report and \
         provide a realistic, data-driven assessment.\n\n\
         EVALUATION CRITERIA:\n\
         - Evidence quality (photo completeness, intake/checkout comparison clarity;\n\
           deduct heavily for missing photos)\n\
         - Legal merit (strength of arguments, applicability of cited articles)\n\
         - Financial reasonableness (claimed amounts vs actual damage)\n\
         - Procedural compliance (timelines, notice requirements)\n\n",
    );
    system.push_str(&rubric.scoring_section());
    system.push_str(
        "\nOUTPUT FORMAT (JSON only, no markdown, exact field set):\n\
         {\n\
           \"win_probability\": 0-100,\n\
           \"confidence\": \"high\"|\"medium\"|\"low\",\n\
           \"summary\": \"under 150 characters\",\n\
           \"case_strength\": \"strong\"|\"moderate\"|\"weak\",\n\
           \"key_strength\": \"...\",\n\
           \"key_weakness\": \"...\",\n\
           \"estimated_outcome\": {\"deposit_return\": \"full\"|\"partial\"|\"minimal\", \"likely_deduction\": \"CHF 0-X\", \"reasoning\": \"...\"},\n\
           \"risk_factors\": [\"...\"],\n\
           \"evidence_gaps\": [{\"item\": \"...\", \"severity\": \"none\"|\"minor\"|\"moderate\"|\"major\", \"description\": \"...\"}],\n\
           \"recommendations\": [\"...\"],\n\
           \"next_steps\": {\"immediate\": \"...\", \"if_disputed\": \"...\", \"escalation\": \"...\"}\n\
         }\n\n\
         Be realistic, not optimistic. Justify the probability with specific factors.\n",
    );

    let user = format!(
        "Defense Report:\n{report_markdown}\n\nEvaluate this case and provide win \
         probability with summary."
    );

    PromptPair { system, user }
}

// ──────────────────────────────────────────────
// Shared payload formatting
// ──────────────────────────────────────────────

/// Render the ledger snapshot as labeled evidence blocks plus a trailing URL
/// reference map, so the model can cite exact URLs.
pub fn evidence_section(evidence: &[ItemEvidence]) -> String {
    let mut out = String::from("=== EVIDENCE ===\n");
    for entry in evidence {
        out.push_str(&format!(
            "\n=== ITEM: {} ({}) — documentation {} ===\n",
            entry.item.name, entry.item.id, entry.completeness
        ));
        match &entry.intake {
            Some(record) if !record.photos.is_empty() => {
                out.push_str(&format!(
                    "BEFORE (intake, captured {}):\n",
                    record.captured_at.format("%Y-%m-%d %H:%M")
                ));
                for (i, url) in record.photos.iter().enumerate() {
                    out.push_str(&format!("  [{}] {}\n", i + 1, url));
                }
            }
            _ => out.push_str("BEFORE (intake): NO PHOTOS\n"),
        }
        match &entry.checkout {
            Some(record) if !record.photos.is_empty() => {
                out.push_str(&format!(
                    "AFTER (checkout, captured {}):\n",
                    record.captured_at.format("%Y-%m-%d %H:%M")
                ));
                for (i, url) in record.photos.iter().enumerate() {
                    out.push_str(&format!("  [{}] {}\n", i + 1, url));
                }
                if let Some(analysis) = record.latest_analysis() {
                    out.push_str("State analysis:\n");
                    out.push_str(&to_pretty_json(analysis));
                    out.push('\n');
                }
            }
            _ => out.push_str("AFTER (checkout): NO PHOTOS\n"),
        }
    }

    out.push_str("\n=== COMPLETE URL REFERENCE MAP (use these EXACT URLs) ===\n");
    for entry in evidence {
        let before: Vec<&str> = entry
            .intake
            .iter()
            .flat_map(|r| r.photos.iter().map(String::as_str))
            .collect();
        let after: Vec<&str> = entry
            .checkout
            .iter()
            .flat_map(|r| r.photos.iter().map(String::as_str))
            .collect();
        out.push_str(&format!(
            "{}:\n  before: {:?}\n  after: {:?}\n",
            entry.item.id, before, after
        ));
    }
    out
}

/// Reconstruct the case timeline from lease dates and actual capture
/// timestamps. Includes the 30-day landlord claim deadline after checkout.
pub fn build_timeline(lease: &LeaseData, evidence: &[ItemEvidence]) -> Vec<TimelineEvent> {
    let mut events = Vec::new();

    let earliest_intake = evidence
        .iter()
        .filter_map(|e| e.intake.as_ref())
        .map(|r| r.captured_at)
        .min();
    let earliest_checkout = evidence
        .iter()
        .filter_map(|e| e.checkout.as_ref())
        .map(|r| r.captured_at)
        .min();

    if let Some(start) = &lease.start_date {
        events.push(TimelineEvent {
            date: start.clone(),
            event: "Lease commencement — asset received in documented condition".into(),
        });
    } else if let Some(intake) = earliest_intake {
        events.push(TimelineEvent {
            date: intake.format("%Y-%m-%d").to_string(),
            event: "Approximate lease commencement (based on intake inspection)".into(),
        });
    }

    if let Some(intake) = earliest_intake {
        let count = evidence.iter().filter(|e| e.intake.is_some()).count();
        events.push(TimelineEvent {
            date: intake.format("%Y-%m-%d").to_string(),
            event: format!("Intake inspection completed — {count} item(s) documented"),
        });
    }

    if let Some(checkout) = earliest_checkout {
        let count = evidence.iter().filter(|e| e.checkout.is_some()).count();
        events.push(TimelineEvent {
            date: checkout.format("%Y-%m-%d").to_string(),
            event: format!("Checkout inspection completed — {count} item(s) documented"),
        });
        events.push(TimelineEvent {
            date: (checkout + Duration::days(30)).format("%Y-%m-%d").to_string(),
            event: "Deadline for landlord claims (30 days per Art. 267 CO)".into(),
        });
    }

    if let Some(end) = &lease.end_date {
        events.push(TimelineEvent {
            date: end.clone(),
            event: "Lease termination date".into(),
        });
    }

    events
}

fn tenant_block(tenant: &TenantInfo) -> String {
    format!(
        "Tenant Information:\n- Name: {}\n- Location: {}\n\n",
        tenant.name.as_deref().unwrap_or("Not provided"),
        tenant.location.as_deref().unwrap_or("Not specified"),
    )
}

fn to_pretty_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

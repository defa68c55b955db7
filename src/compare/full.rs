//! Full before/after comparison producing a damage verdict.
//!
//! Tie-break policy: when the model is not confident the photo sets even show
//! the same location, the verdict is forced to "no damage, normal wear, not
//! liable"; the engine fails toward the tenant, never toward unverified
//! liability. The same direction applies when the model output cannot be
//! parsed at all.

use serde::Deserialize;

use crate::gateway::{ChatMessage, ChatModel, ContentPart, GenerateOptions};
use crate::models::{ConfidenceTier, DamageAnalysis, Severity, StateGrade};
use crate::recovery;

use super::prompt::{deterioration_prompt, full_comparison_prompt};

/// Compare the complete before/after photo sets for one item.
pub fn compare_item<C: ChatModel>(
    client: &C,
    item_name: &str,
    before_refs: &[String],
    after_refs: &[String],
) -> DamageAnalysis {
    let prompt = full_comparison_prompt(item_name, before_refs.len(), after_refs.len());
    let messages = vec![ChatMessage::user_parts(labeled_photo_parts(
        prompt,
        before_refs,
        after_refs,
    ))];

    let raw = match client.generate(&messages, &GenerateOptions::vision_verdict()) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(item = %item_name, error = %e, "comparison call failed");
            return unverified_verdict(before_refs, after_refs);
        }
    };

    let mut analysis = match recovery::recover::<DamageAnalysis>(&raw) {
        Ok(analysis) => analysis,
        Err(e) => {
            tracing::warn!(item = %item_name, error = %e, "comparison verdict unparseable");
            return unverified_verdict(before_refs, after_refs);
        }
    };

    if analysis.photos_analyzed.is_none() {
        analysis.photos_analyzed = Some((before_refs.len() + after_refs.len()) as u32);
    }

    // Low location confidence means the verdict may describe the wrong spot.
    // Severity collapses to none rather than guessing.
    if matches!(analysis.location_confidence, Some(ConfidenceTier::Low))
        || analysis.same_location == Some(false)
    {
        tracing::info!(item = %item_name, "location uncertain — forcing no-liability verdict");
        analysis.has_damage = false;
        analysis.severity = Severity::None;
        analysis.is_normal_wear = true;
        analysis.tenant_liable = false;
    }

    tracing::info!(
        item = %item_name,
        has_damage = analysis.has_damage,
        severity = ?analysis.severity,
        tenant_liable = analysis.tenant_liable,
        "comparison complete"
    );
    analysis
}

/// Wire shape of the deterioration grading response.
#[derive(Deserialize)]
struct DeteriorationVerdict {
    state_grade: StateGrade,
    #[serde(default)]
    has_damage: bool,
    #[serde(default)]
    severity: Severity,
    #[serde(default)]
    description: String,
    #[serde(default)]
    tenant_liable: bool,
    #[serde(default = "default_true")]
    is_normal_wear: bool,
}

fn default_true() -> bool {
    true
}

/// Simple A+–F grading of state deterioration across both photo sets.
pub fn grade_deterioration<C: ChatModel>(
    client: &C,
    item_name: &str,
    before_refs: &[String],
    after_refs: &[String],
) -> DamageAnalysis {
    let prompt = deterioration_prompt(item_name);
    let messages = vec![ChatMessage::user_parts(labeled_photo_parts(
        prompt,
        before_refs,
        after_refs,
    ))];

    let fallback = || {
        let mut analysis = unverified_verdict(before_refs, after_refs);
        analysis.state_grade = Some(StateGrade::B);
        analysis
    };

    let raw = match client.generate(&messages, &GenerateOptions::vision_verdict()) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(item = %item_name, error = %e, "deterioration call failed");
            return fallback();
        }
    };

    match recovery::recover::<DeteriorationVerdict>(&raw) {
        Ok(verdict) => {
            let mut analysis = DamageAnalysis {
                has_damage: verdict.has_damage,
                severity: verdict.severity,
                description: verdict.description,
                is_normal_wear: verdict.is_normal_wear,
                tenant_liable: verdict.tenant_liable,
                damage_types: vec![],
                specific_issues: vec![],
                liability_reasoning: None,
                repair_estimate: None,
                same_location: None,
                location_confidence: None,
                photos_analyzed: Some((before_refs.len() + after_refs.len()) as u32),
                state_grade: Some(verdict.state_grade),
            };
            if analysis.description.is_empty() {
                analysis.description = "No notable state differences observed.".to_string();
            }
            analysis
        }
        Err(e) => {
            tracing::warn!(item = %item_name, error = %e, "deterioration verdict unparseable");
            fallback()
        }
    }
}

/// Interleave the rubric with labeled photo parts: all BEFORE photos, then
/// all AFTER photos, each preceded by a position label.
fn labeled_photo_parts(
    prompt: String,
    before_refs: &[String],
    after_refs: &[String],
) -> Vec<ContentPart> {
    let mut parts = Vec::with_capacity(1 + 2 * (before_refs.len() + after_refs.len()));
    parts.push(ContentPart::text(prompt));
    for (i, url) in before_refs.iter().enumerate() {
        parts.push(ContentPart::text(format!("--- BEFORE Photo {} ---", i + 1)));
        parts.push(ContentPart::image(url));
    }
    for (i, url) in after_refs.iter().enumerate() {
        parts.push(ContentPart::text(format!("--- AFTER Photo {} ---", i + 1)));
        parts.push(ContentPart::image(url));
    }
    parts
}

fn unverified_verdict(before_refs: &[String], after_refs: &[String]) -> DamageAnalysis {
    let mut analysis = DamageAnalysis::unverified(
        "Comparison could not be completed. No damage is recorded without a verifiable verdict.",
    );
    analysis.photos_analyzed = Some((before_refs.len() + after_refs.len()) as u32);
    analysis
}

//! Quick location-match check for freshly captured checkout photos.
//!
//! Runs before a capture is committed to the ledger, so an obviously
//! mismatched photo can be rejected at the source. An unparseable verdict
//! accepts the capture; blocking the user on a flaky model would lose
//! evidence, and the full comparison still sees every committed photo.

use serde::{Deserialize, Serialize};

use crate::gateway::{ChatMessage, ChatModel, ContentPart, GenerateOptions};
use crate::models::ConfidenceTier;
use crate::recovery;

use super::prompt::quick_match_prompt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureAdvice {
    Accept,
    Retake,
    Warning,
}

/// Verdict on whether a new capture shows the same location as the reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchCheck {
    pub is_match: bool,
    pub confidence: ConfidenceTier,
    #[serde(default)]
    pub reason: String,
    pub recommendation: CaptureAdvice,
}

impl MatchCheck {
    fn skipped() -> Self {
        Self {
            is_match: true,
            confidence: ConfidenceTier::Medium,
            reason: "Validation check skipped".to_string(),
            recommendation: CaptureAdvice::Accept,
        }
    }
}

/// Validate that `after_ref` depicts the same location/angle as `before_ref`.
pub fn quick_match<C: ChatModel>(
    client: &C,
    item_name: &str,
    before_ref: &str,
    after_ref: &str,
) -> MatchCheck {
    let messages = vec![ChatMessage::user_parts(vec![
        ContentPart::text(quick_match_prompt(item_name)),
        ContentPart::image(before_ref),
        ContentPart::image(after_ref),
    ])];

    let raw = match client.generate(&messages, &GenerateOptions::vision_verdict()) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(item = %item_name, error = %e, "quick match failed — allowing capture");
            return MatchCheck::skipped();
        }
    };

    match recovery::recover::<MatchCheck>(&raw) {
        Ok(check) => {
            tracing::info!(
                item = %item_name,
                is_match = check.is_match,
                confidence = ?check.confidence,
                "quick match verdict"
            );
            check
        }
        Err(e) => {
            tracing::warn!(item = %item_name, error = %e, "quick match unparseable — allowing capture");
            MatchCheck::skipped()
        }
    }
}

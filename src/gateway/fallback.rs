//! Deterministic offline answers.
//!
//! When no credential is configured, or the endpoint fails, the gateway
//! answers from this fixed rubric instead of retrying. Substituting a local
//! deterministic answer is the whole failure policy; there is no retry path
//! against the paid endpoint.

use super::types::ChatMessage;

const DEPOSIT_ANSWER: &str = "Based on Swiss rental law, deposits are typically limited to 3 months rent for residential properties. For vehicles, a deductible is standard practice. Any deductions must be justified and documented.";

const DAMAGE_ANSWER: &str = "According to Article 267 of the Swiss Code of Obligations, tenants are only liable for damages beyond normal wear and tear. Small scratches and minor wear after reasonable use are generally not chargeable.";

const NOTICE_ANSWER: &str = "Notice periods in Switzerland vary by canton and contract type. Typically, residential leases require 3 months notice. Check your specific contract for the exact terms and official notice dates.";

const REPAIR_ANSWER: &str = "Landlords are responsible for major repairs and structural maintenance. Tenants typically handle minor repairs and regular upkeep. Document all issues in writing and keep records of communications.";

const DEFAULT_ANSWER: &str = "I understand your question about the lease agreement. Based on Swiss rental law and the terms of your contract, I recommend documenting everything in writing and consulting with your local tenant association if you need specific legal advice.";

/// Answer a prompt by keyword category: deposit, damage, notice, repair.
///
/// Matches against the last message only; that is where the user's actual
/// question lives; earlier messages are boilerplate context.
pub fn offline_answer(messages: &[ChatMessage]) -> String {
    let Some(last) = messages.last() else {
        return "I can help you with questions about your lease agreement.".to_string();
    };
    let query = last.text().to_lowercase();

    if query.contains("deposit") || query.contains("deductible") {
        return DEPOSIT_ANSWER.to_string();
    }
    if query.contains("damage") || query.contains("scratch") {
        return DAMAGE_ANSWER.to_string();
    }
    if query.contains("notice") || query.contains("terminate") {
        return NOTICE_ANSWER.to_string();
    }
    if query.contains("repair") || query.contains("maintenance") {
        return REPAIR_ANSWER.to_string();
    }

    DEFAULT_ANSWER.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deposit_keyword_routes_to_deposit_answer() {
        let messages = vec![ChatMessage::user("Can my landlord keep the deposit?")];
        assert_eq!(offline_answer(&messages), DEPOSIT_ANSWER);
    }

    #[test]
    fn damage_keyword_routes_to_damage_answer() {
        let messages = vec![ChatMessage::user("There is a scratch on the parquet")];
        assert_eq!(offline_answer(&messages), DAMAGE_ANSWER);
    }

    #[test]
    fn notice_and_repair_categories() {
        assert_eq!(
            offline_answer(&[ChatMessage::user("how do I terminate early?")]),
            NOTICE_ANSWER
        );
        assert_eq!(
            offline_answer(&[ChatMessage::user("who pays for maintenance?")]),
            REPAIR_ANSWER
        );
    }

    #[test]
    fn unmatched_query_gets_default_answer() {
        let messages = vec![ChatMessage::user("what color is the kitchen?")];
        assert_eq!(offline_answer(&messages), DEFAULT_ANSWER);
    }

    #[test]
    fn only_last_message_is_matched() {
        let messages = vec![
            ChatMessage::system("You are a deposit expert."),
            ChatMessage::user("who pays for repairs?"),
        ];
        assert_eq!(offline_answer(&messages), REPAIR_ANSWER);
    }

    #[test]
    fn empty_conversation_still_answers() {
        assert!(offline_answer(&[]).contains("lease agreement"));
    }
}

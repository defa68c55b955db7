//! Three-stage defense pipeline: context extraction → report drafting →
//! case evaluation.
//!
//! Strictly sequential, no stage re-entrant: each stage's prompt is built
//! from the prior stage's validated output. Context and Report failures abort
//! the run; later stages have no usable input, and a fabricated legal
//! document is worse than none. Evaluation failure is non-fatal: the
//! already-drafted report is returned with a neutral evaluation instead of
//! being discarded. Intermediate state lives only for the duration of the
//! run.

use uuid::Uuid;

use crate::composer::{
    context_extraction_prompts, evaluation_prompts, prompts::build_timeline, report_prompts,
    LegalRubric,
};
use crate::gateway::{ChatMessage, ChatModel, ContentPart, GenerateOptions};
use crate::ledger::{EvidenceLedger, ItemEvidence};
use crate::models::{
    CaseContext, CaseEvaluation, DefenseReport, LeaseData, TenantInfo,
};
use crate::recovery::{self, parse_array_lenient};

use super::report;
use super::{Stage, StageFailure};

/// Terminal artifact of a successful run.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DefenseOutcome {
    pub context: CaseContext,
    pub report: DefenseReport,
    pub evaluation: CaseEvaluation,
}

pub struct DefensePipeline<'a, C: ChatModel> {
    client: &'a C,
    rubric: &'a LegalRubric,
    jurisdiction: String,
    tenant: Option<TenantInfo>,
}

impl<'a, C: ChatModel> DefensePipeline<'a, C> {
    pub fn new(client: &'a C, rubric: &'a LegalRubric, jurisdiction: &str) -> Self {
        Self {
            client,
            rubric,
            jurisdiction: jurisdiction.to_string(),
            tenant: None,
        }
    }

    pub fn with_tenant(mut self, tenant: TenantInfo) -> Self {
        self.tenant = Some(tenant);
        self
    }

    /// Execute the full pipeline for one user query.
    pub fn run(
        &self,
        lease: &LeaseData,
        ledger: &EvidenceLedger,
        user_query: &str,
    ) -> Result<DefenseOutcome, StageFailure> {
        let _span =
            tracing::info_span!("defense_pipeline", jurisdiction = %self.jurisdiction).entered();
        let evidence = ledger.snapshot();

        // Stage 1: Context; fatal on failure
        let context = self
            .extract_context(lease, &evidence, user_query)
            .map_err(|reason| self.stage_failure(Stage::Context, reason, ledger))?;
        tracing::info!(
            case_id = %context.case_id,
            evidence_items = context.evidence_items.len(),
            "context extracted"
        );

        // Stage 2: Report; fatal on failure, no fallback report is synthesized
        let report = self
            .draft_report(&context, lease, &evidence, ledger, user_query)
            .map_err(|reason| self.stage_failure(Stage::Report, reason, ledger))?;
        tracing::info!(
            blocks = report.blocks.len(),
            citations = report.citations.len(),
            "report drafted"
        );

        // Stage 3: Evaluation; non-fatal, degrade to a neutral evaluation
        let evaluation = match self.evaluate_case(&report) {
            Ok(evaluation) => evaluation,
            Err(reason) => {
                tracing::warn!(%reason, "evaluation stage failed — returning neutral evaluation");
                CaseEvaluation::neutral(&report)
            }
        };

        Ok(DefenseOutcome {
            context,
            report,
            evaluation,
        })
    }

    fn extract_context(
        &self,
        lease: &LeaseData,
        evidence: &[ItemEvidence],
        user_query: &str,
    ) -> Result<CaseContext, String> {
        let prompts = context_extraction_prompts(
            self.rubric,
            &self.jurisdiction,
            lease,
            evidence,
            user_query,
            self.tenant.as_ref(),
        );
        let messages = vec![
            ChatMessage::system(prompts.system),
            ChatMessage::user(prompts.user),
        ];
        let raw = self
            .client
            .generate(&messages, &GenerateOptions::extraction())
            .map_err(|e| e.to_string())?;

        let value = recovery::recover_value(&raw).map_err(|e| e.to_string())?;
        let context = context_from_value(value, user_query);

        // A context with neither lease facts nor evidence gives the report
        // stage nothing to argue from
        if context.evidence_items.is_empty() && context.lease_context.clauses.is_empty() {
            return Err("extracted context contains no evidence items and no clauses".to_string());
        }
        Ok(context)
    }

    fn draft_report(
        &self,
        context: &CaseContext,
        lease: &LeaseData,
        evidence: &[ItemEvidence],
        ledger: &EvidenceLedger,
        user_query: &str,
    ) -> Result<DefenseReport, String> {
        let context_json = serde_json::to_string_pretty(context)
            .map_err(|e| format!("context serialization failed: {e}"))?;
        let timeline = build_timeline(lease, evidence);
        let prompts = report_prompts(
            self.rubric,
            &self.jurisdiction,
            &context_json,
            user_query,
            &timeline,
        );

        // Every photo reference across all items rides along as an attachment
        let mut parts = vec![ContentPart::text(prompts.user)];
        for url in ledger.all_photo_refs() {
            parts.push(ContentPart::image(url));
        }
        let messages = vec![
            ChatMessage::system(prompts.system),
            ChatMessage::user_parts(parts),
        ];

        let markdown = self
            .client
            .generate(&messages, &GenerateOptions::drafting())
            .map_err(|e| e.to_string())?;

        report::validate_report(&markdown)?;
        let marked = crate::citations::mark_citations(&markdown);
        Ok(report::from_markdown(marked))
    }

    fn evaluate_case(&self, report: &DefenseReport) -> Result<CaseEvaluation, String> {
        let prompts = evaluation_prompts(self.rubric, &report.markdown);
        let messages = vec![
            ChatMessage::system(prompts.system),
            ChatMessage::user(prompts.user),
        ];
        let raw = self
            .client
            .generate(&messages, &GenerateOptions::extraction())
            .map_err(|e| e.to_string())?;

        let mut evaluation: CaseEvaluation =
            recovery::recover(&raw).map_err(|e| e.to_string())?;
        if let Some(p) = evaluation.win_probability {
            evaluation.win_probability = Some(p.min(100));
        }
        Ok(evaluation)
    }

    fn stage_failure(
        &self,
        stage: Stage,
        reason: String,
        ledger: &EvidenceLedger,
    ) -> StageFailure {
        let remediation = ledger
            .missing_documentation_report()
            .into_iter()
            .map(|gap| format!("insufficient evidence — {}", gap.description))
            .collect();
        tracing::error!(%stage, %reason, "pipeline run aborted");
        StageFailure {
            stage,
            reason,
            remediation,
        }
    }
}

/// Build a CaseContext field-wise so one malformed array entry does not
/// discard the whole extraction.
fn context_from_value(value: serde_json::Value, user_query: &str) -> CaseContext {
    let case_id = value
        .get("case_id")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("CASE-{}", Uuid::new_v4()));

    let query = value
        .get("user_query")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| user_query.to_string());

    CaseContext {
        case_id,
        user_query: query,
        lease_context: value
            .get("lease_context")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default(),
        evidence_items: parse_array_lenient(value.get("evidence_items")),
        legal_references: parse_array_lenient(value.get("legal_references")),
        key_factors: value
            .get("key_factors")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MockChatModel;
    use crate::models::{AssetType, ConfidenceTier, EvidencePhase, InspectionItem, Priority};
    use chrono::{Duration, Utc};

    fn lease() -> LeaseData {
        LeaseData {
            title: "Apartment lease".into(),
            asset_type: AssetType::Property,
            asset_name: "Rue de la Paix 10".into(),
            risk_score: 45,
            inspection_items: vec![InspectionItem {
                id: "kitchen_counter".into(),
                name: "Kitchen Countertops".into(),
                room: Some("Kitchen".into()),
                description: "Photo all surfaces".into(),
                photo_angles: vec![],
                recommended_photos: Some(3),
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
            start_date: Some("2023-06-01".into()),
            end_date: None,
        }
    }

    fn ledger_with_partial_evidence() -> EvidenceLedger {
        let ledger = EvidenceLedger::new(lease().inspection_items);
        ledger
            .record_evidence(
                "kitchen_counter",
                EvidencePhase::Intake,
                &["https://store/intake/kc-1.jpg".to_string()],
                None,
                Utc::now() - Duration::days(900),
            )
            .unwrap();
        ledger
    }

    fn valid_context_json() -> String {
        r#"{
            "case_id": "CASE-123",
            "user_query": "landlord claims counter damage",
            "lease_context": {
                "asset_type": "Property",
                "asset_name": "Rue de la Paix 10",
                "risk_score": 45,
                "clauses": [{"section": "Damage", "text": "Tenant liable", "status": "risk"}]
            },
            "evidence_items": [{
                "item_id": "kitchen_counter",
                "item_name": "Kitchen Countertops",
                "priority": "high",
                "intake_photos": ["https://store/intake/kc-1.jpg"],
                "checkout_photos": [],
                "documentation_completeness": "partial"
            }],
            "legal_references": [{"article": "Art. 267 CO", "topic": "Normal wear", "relevance": "Core defense"}],
            "key_factors": {"strengths": ["intake baseline exists"], "weaknesses": ["no checkout photos"]}
        }"#
        .to_string()
    }

    fn valid_report_markdown() -> String {
        "# Defense Report: Rue de la Paix 10\n\n\
         ## Executive Summary\n\nStrong position under Art. 267 CO.\n\n\
         ## Evidence Analysis\n\nIntake baseline exists for the countertop.\n\n\
         ## Legal Assessment\n\nArt. 267 CO exempts normal wear.\n\n\
         ## Conclusion\n\nThe landlord bears the burden of proof.\n"
            .to_string()
    }

    fn valid_evaluation_json() -> String {
        r#"{
            "win_probability": 72,
            "confidence": "medium",
            "summary": "Defensible case, weakened by missing checkout photos.",
            "case_strength": "moderate",
            "evidence_gaps": [{"item": "kitchen_counter", "severity": "moderate", "description": "No checkout photos"}]
        }"#
        .to_string()
    }

    #[test]
    fn full_run_threads_stage_outputs() {
        let client = MockChatModel::scripted(vec![
            valid_context_json(),
            valid_report_markdown(),
            valid_evaluation_json(),
        ]);
        let rubric = LegalRubric::default();
        let pipeline = DefensePipeline::new(&client, &rubric, "Vaud");
        let ledger = ledger_with_partial_evidence();

        let outcome = pipeline
            .run(&lease(), &ledger, "landlord claims counter damage")
            .unwrap();

        assert_eq!(outcome.context.case_id, "CASE-123");
        assert!(outcome.report.markdown.contains("**Art. 267 CO**"));
        assert_eq!(outcome.evaluation.win_probability, Some(72));
        assert_eq!(client.call_count(), 3);

        // The report prompt was built from stage 1's validated output
        let calls = client.calls();
        assert!(calls[1].contains("CASE-123"));
        assert!(calls[2].contains("Defense Report"));
    }

    #[test]
    fn context_failure_aborts_before_report_stage() {
        // Network failure with no offline fallback defined for structured
        // JSON: the gateway fallback text is prose, recovery fails, the run
        // aborts naming Context
        let client = MockChatModel::scripted(vec![
            "I understand your question about the lease agreement.".to_string(),
        ]);
        let rubric = LegalRubric::default();
        let pipeline = DefensePipeline::new(&client, &rubric, "Vaud");
        let ledger = ledger_with_partial_evidence();

        let failure = pipeline.run(&lease(), &ledger, "deposit").unwrap_err();
        assert_eq!(failure.stage, Stage::Context);
        // The report stage was never invoked
        assert_eq!(client.call_count(), 1);
        // Remediation names the concrete gap
        assert!(failure
            .remediation
            .iter()
            .any(|r| r.contains("add checkout photos for Kitchen Countertops")));
        assert!(failure.to_string().contains("Context"));
    }

    #[test]
    fn report_failure_aborts_without_fallback_report() {
        let client = MockChatModel::scripted(vec![
            valid_context_json(),
            "Sorry, I cannot draft the report right now.".to_string(),
        ]);
        let rubric = LegalRubric::default();
        let pipeline = DefensePipeline::new(&client, &rubric, "Vaud");
        let ledger = ledger_with_partial_evidence();

        let failure = pipeline.run(&lease(), &ledger, "deposit").unwrap_err();
        assert_eq!(failure.stage, Stage::Report);
        // Evaluation was never invoked
        assert_eq!(client.call_count(), 2);
    }

    #[test]
    fn evaluation_failure_degrades_to_neutral() {
        let client = MockChatModel::scripted(vec![
            valid_context_json(),
            valid_report_markdown(),
            "The case looks decent overall, maybe 70%.".to_string(),
        ]);
        let rubric = LegalRubric::default();
        let pipeline = DefensePipeline::new(&client, &rubric, "Vaud");
        let ledger = ledger_with_partial_evidence();

        let outcome = pipeline.run(&lease(), &ledger, "deposit").unwrap();
        assert!(outcome.evaluation.win_probability.is_none());
        assert_eq!(outcome.evaluation.confidence, ConfidenceTier::Low);
        // Summary is an excerpt of the report itself
        assert!(outcome.evaluation.summary.starts_with("# Defense Report"));
        // The drafted report is preserved, not discarded
        assert!(outcome.report.markdown.contains("Executive Summary"));
    }

    #[test]
    fn empty_context_is_rejected_as_stage_failure() {
        let client = MockChatModel::scripted(vec!["{}".to_string()]);
        let rubric = LegalRubric::default();
        let pipeline = DefensePipeline::new(&client, &rubric, "Vaud");
        let ledger = ledger_with_partial_evidence();

        let failure = pipeline.run(&lease(), &ledger, "deposit").unwrap_err();
        assert_eq!(failure.stage, Stage::Context);
    }

    #[test]
    fn malformed_evidence_entries_are_skipped_not_fatal() {
        let context_with_bad_entry = r#"{
            "lease_context": {"clauses": [{"section": "Damage", "text": "x", "status": "risk"}]},
            "evidence_items": [
                {"item_id": "kitchen_counter", "item_name": "Kitchen Countertops"},
                "not an object at all"
            ]
        }"#;
        let client = MockChatModel::scripted(vec![
            context_with_bad_entry.to_string(),
            valid_report_markdown(),
            valid_evaluation_json(),
        ]);
        let rubric = LegalRubric::default();
        let pipeline = DefensePipeline::new(&client, &rubric, "Vaud");
        let ledger = ledger_with_partial_evidence();

        let outcome = pipeline.run(&lease(), &ledger, "deposit").unwrap();
        assert_eq!(outcome.context.evidence_items.len(), 1);
        // Missing case_id is filled in deterministically
        assert!(outcome.context.case_id.starts_with("CASE-"));
        assert_eq!(outcome.context.user_query, "deposit");
    }

    #[test]
    fn evaluation_probability_is_clamped() {
        let client = MockChatModel::scripted(vec![
            valid_context_json(),
            valid_report_markdown(),
            r#"{"win_probability": 250, "confidence": "high", "summary": "s"}"#.to_string(),
        ]);
        let rubric = LegalRubric::default();
        let pipeline = DefensePipeline::new(&client, &rubric, "Vaud");
        let ledger = ledger_with_partial_evidence();

        let outcome = pipeline.run(&lease(), &ledger, "deposit").unwrap();
        assert_eq!(outcome.evaluation.win_probability, Some(100));
    }
}

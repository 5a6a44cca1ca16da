use std::sync::Arc;

use uuid::Uuid;

use verdict_domain::record::{DecisionRecord, DecisionState, ReviewVerdict};
use verdict_service::{
	DecisionListRequest, Error, Providers, ReviewRequest, RiskAssessmentRequest, VerdictService,
};
use verdict_domain::scoring::ScreeningResponse;
use verdict_testkit::{FixedEmbedder, MemoryKnowledge, RecordingAudit, ScriptedExtractor};

struct Harness {
	service: VerdictService,
	audit: Arc<RecordingAudit>,
}

fn harness() -> Harness {
	let audit = Arc::new(RecordingAudit::new());
	let service = VerdictService::with_collaborators(
		verdict_testkit::config(),
		Arc::new(MemoryKnowledge::new()),
		Providers::new(
			Arc::new(FixedEmbedder::new(8)),
			Arc::new(ScriptedExtractor::returning(serde_json::json!({ "features": [] }))),
		),
		audit.clone(),
	);

	Harness { service, audit }
}

fn responses_for(scores: &[(&str, f32)]) -> Vec<ScreeningResponse> {
	let mut responses = Vec::new();

	for (category, score) in scores {
		for question in 0..6 {
			responses.push(ScreeningResponse {
				question_id: format!("{category}-{question}"),
				category: (*category).to_string(),
				value: Some(score / 10.0),
				max_value: 10.0,
			});
		}
	}

	responses
}

/// Produces a decision in `NeedsReview` (high risk: every category at 85).
async fn decision_awaiting_review(harness: &Harness) -> DecisionRecord {
	let response = harness
		.service
		.compute_risk_assessment(RiskAssessmentRequest {
			requester_role: "clinician".to_string(),
			patient_ref: format!("patient-{}", Uuid::new_v4()),
			deadline_ms: None,
			responses: responses_for(&[
				("communication", 85.0),
				("gross_motor", 85.0),
				("personal_social", 85.0),
			]),
		})
		.await
		.expect("assessment must succeed");
	let decision = response.decision;

	assert_eq!(decision.state, DecisionState::NeedsReview);

	decision
}

fn approve(decision_id: Uuid, reviewer: &str) -> ReviewRequest {
	ReviewRequest {
		decision_id,
		reviewer_id: reviewer.to_string(),
		verdict: ReviewVerdict::Approve,
	}
}

#[tokio::test]
async fn approving_finalizes_and_audits_both_transitions() {
	let harness = harness();
	let decision = decision_awaiting_review(&harness).await;
	let original_score = decision.score.clone();
	let response = harness
		.service
		.submit_review_verdict(approve(decision.id, "dr-lee"))
		.await
		.expect("the verdict must apply");
	let reviewed = response.decision;

	assert_eq!(reviewed.state, DecisionState::Finalized);
	assert_eq!(reviewed.reviewed_by.as_deref(), Some("dr-lee"));
	assert_eq!(reviewed.score, original_score, "the original score must be preserved");

	let states = harness.audit.states();

	assert!(states.contains(&DecisionState::Reviewed));
	assert!(states.contains(&DecisionState::Finalized));
}

#[tokio::test]
async fn override_records_the_new_value_beside_the_original_score() {
	let harness = harness();
	let decision = decision_awaiting_review(&harness).await;
	let original_score = decision.score.clone().expect("score present");
	let response = harness
		.service
		.submit_review_verdict(ReviewRequest {
			decision_id: decision.id,
			reviewer_id: "dr-kim".to_string(),
			verdict: ReviewVerdict::Override { raw_score: 40.0 },
		})
		.await
		.expect("the override must apply");
	let reviewed = response.decision;
	let outcome = reviewed.review.expect("review outcome recorded");

	assert_eq!(outcome.verdict, ReviewVerdict::Override { raw_score: 40.0 });
	assert_eq!(
		reviewed.score.expect("score present").raw_score,
		original_score.raw_score,
		"an override never replaces the computed score",
	);
}

#[tokio::test]
async fn the_second_verdict_loses_the_race() {
	let harness = harness();
	let decision = decision_awaiting_review(&harness).await;

	harness
		.service
		.submit_review_verdict(approve(decision.id, "dr-lee"))
		.await
		.expect("the first verdict applies");

	let err = harness
		.service
		.submit_review_verdict(approve(decision.id, "dr-kim"))
		.await
		.expect_err("the second verdict must be rejected");

	assert!(matches!(err, Error::ReviewProtocol { .. }), "unexpected error: {err}");

	let stored = harness
		.service
		.get_decision(decision.id)
		.await
		.expect("the record must exist")
		.decision;

	assert_eq!(stored.reviewed_by.as_deref(), Some("dr-lee"));
}

#[tokio::test]
async fn verdicts_for_auto_acceptable_decisions_are_rejected() {
	// Low scores with no retrieval still land in NeedsReview (confidence),
	// so force an auto-acceptable record by relaxing the gate.
	let mut cfg = verdict_testkit::config();

	cfg.gate.review_threshold = 0.0;

	let service = VerdictService::with_collaborators(
		cfg,
		Arc::new(MemoryKnowledge::new()),
		Providers::new(
			Arc::new(FixedEmbedder::new(8)),
			Arc::new(ScriptedExtractor::returning(serde_json::json!({ "features": [] }))),
		),
		Arc::new(RecordingAudit::new()),
	);
	let decision = service
		.compute_risk_assessment(RiskAssessmentRequest {
			requester_role: "clinician".to_string(),
			patient_ref: "patient-a".to_string(),
			deadline_ms: None,
			responses: responses_for(&[
				("communication", 20.0),
				("gross_motor", 20.0),
				("personal_social", 20.0),
			]),
		})
		.await
		.expect("assessment must succeed")
		.decision;

	assert_eq!(decision.state, DecisionState::AutoAcceptable);

	let err = service
		.submit_review_verdict(approve(decision.id, "dr-lee"))
		.await
		.expect_err("auto-acceptable decisions take no verdicts");

	assert!(matches!(err, Error::ReviewProtocol { .. }), "unexpected error: {err}");
}

#[tokio::test]
async fn unknown_decisions_are_not_found() {
	let harness = harness();
	let err = harness
		.service
		.submit_review_verdict(approve(Uuid::new_v4(), "dr-lee"))
		.await
		.expect_err("unknown ids must be rejected");

	assert!(matches!(err, Error::NotFound { .. }), "unexpected error: {err}");
}

#[tokio::test]
async fn out_of_range_overrides_are_rejected() {
	let harness = harness();
	let decision = decision_awaiting_review(&harness).await;
	let err = harness
		.service
		.submit_review_verdict(ReviewRequest {
			decision_id: decision.id,
			reviewer_id: "dr-lee".to_string(),
			verdict: ReviewVerdict::Override { raw_score: 250.0 },
		})
		.await
		.expect_err("out-of-range overrides must be rejected");

	assert!(matches!(err, Error::InvalidRequest { .. }), "unexpected error: {err}");

	let stored = harness
		.service
		.get_decision(decision.id)
		.await
		.expect("the record must exist")
		.decision;

	assert_eq!(stored.state, DecisionState::NeedsReview, "no state change on rejection");
}

#[tokio::test]
async fn blank_reviewers_are_rejected() {
	let harness = harness();
	let decision = decision_awaiting_review(&harness).await;
	let err = harness
		.service
		.submit_review_verdict(approve(decision.id, "   "))
		.await
		.expect_err("blank reviewers must be rejected");

	assert!(matches!(err, Error::InvalidRequest { .. }), "unexpected error: {err}");
}

#[tokio::test]
async fn the_review_queue_lists_decisions_awaiting_review() {
	let harness = harness();
	let first = decision_awaiting_review(&harness).await;
	let second = decision_awaiting_review(&harness).await;
	let queue = harness
		.service
		.list_decisions(DecisionListRequest { state: Some(DecisionState::NeedsReview) })
		.await
		.expect("listing must succeed");
	let ids: Vec<Uuid> = queue.decisions.iter().map(|decision| decision.id).collect();

	assert!(ids.contains(&first.id));
	assert!(ids.contains(&second.id));

	harness
		.service
		.submit_review_verdict(approve(first.id, "dr-lee"))
		.await
		.expect("verdict applies");

	let queue = harness
		.service
		.list_decisions(DecisionListRequest { state: Some(DecisionState::NeedsReview) })
		.await
		.expect("listing must succeed");
	let ids: Vec<Uuid> = queue.decisions.iter().map(|decision| decision.id).collect();

	assert!(!ids.contains(&first.id));
	assert!(ids.contains(&second.id));
}

use std::sync::Arc;

use time::OffsetDateTime;

use verdict_service::{Error, GuidelineQuery, Providers, VerdictService};
use verdict_storage::models::ReviewStatus;
use verdict_testkit::{
	FixedEmbedder, MemoryKnowledge, RecordingAudit, ScriptedExtractor, approved_document, document,
};

struct Harness {
	service: VerdictService,
	knowledge: Arc<MemoryKnowledge>,
}

fn harness() -> Harness {
	let knowledge = Arc::new(MemoryKnowledge::new());
	let service = VerdictService::with_collaborators(
		verdict_testkit::config(),
		knowledge.clone(),
		Providers::new(
			Arc::new(FixedEmbedder::new(8)),
			Arc::new(ScriptedExtractor::returning(serde_json::json!({ "features": [] }))),
		),
		Arc::new(RecordingAudit::new()),
	);

	Harness { service, knowledge }
}

fn query_embedding(query: &str) -> Vec<f32> {
	FixedEmbedder::vector_for(8, query)
}

fn orthogonal(embedding: &[f32]) -> Vec<f32> {
	embedding.iter().map(|value| -value).collect()
}

fn query(text: &str) -> GuidelineQuery {
	GuidelineQuery { query: text.to_string(), min_relevance: None, top_k: None }
}

#[tokio::test]
async fn only_approved_documents_above_the_threshold_surface() {
	let harness = harness();
	let text = "guidance for borderline screening results";
	let embedding = query_embedding(text);
	let recent = OffsetDateTime::now_utc() - time::Duration::days(10);

	harness.knowledge.seed(
		approved_document("Approved and relevant", "Schedule a follow-up visit.", recent),
		embedding.clone(),
	);
	harness.knowledge.seed(
		document("Pending review", "Unvetted draft guidance.", ReviewStatus::Pending, recent),
		embedding.clone(),
	);
	harness.knowledge.seed(
		approved_document("Approved but unrelated", "Unrelated content.", recent),
		orthogonal(&embedding),
	);

	let response =
		harness.service.retrieve_guidelines(query(text)).await.expect("retrieval succeeds");
	let result = response.result;

	assert!(!result.degraded);
	assert_eq!(result.items.len(), 1);
	assert_eq!(result.items[0].title, "Approved and relevant");
	assert!(result.items[0].relevance >= 0.6);
}

#[tokio::test]
async fn recency_orders_equally_relevant_documents() {
	let harness = harness();
	let text = "repeat screening interval";
	let embedding = query_embedding(text);
	let now = OffsetDateTime::now_utc();

	harness.knowledge.seed(
		approved_document("Stale", "Old guidance.", now - time::Duration::days(900)),
		embedding.clone(),
	);
	harness.knowledge.seed(
		approved_document("Fresh", "Current guidance.", now - time::Duration::days(5)),
		embedding.clone(),
	);

	let response =
		harness.service.retrieve_guidelines(query(text)).await.expect("retrieval succeeds");
	let result = response.result;

	assert_eq!(result.items.len(), 2);
	assert_eq!(result.items[0].title, "Fresh");
	assert!(result.items[0].explain.final_score >= result.items[1].explain.final_score);
}

#[tokio::test]
async fn single_store_failure_is_retried_transparently() {
	let harness = harness();
	let text = "hearing screening referral";
	let embedding = query_embedding(text);

	harness.knowledge.seed(
		approved_document("Referral guidance", "Refer after two failed screens.", OffsetDateTime::now_utc()),
		embedding,
	);
	harness.knowledge.fail_next(1);

	let response =
		harness.service.retrieve_guidelines(query(text)).await.expect("retrieval succeeds");
	let result = response.result;

	assert!(!result.degraded, "one failure must be absorbed by the retry");
	assert_eq!(result.items.len(), 1);
	assert_eq!(harness.knowledge.search_calls(), 2);
}

#[tokio::test]
async fn double_store_failure_returns_the_degraded_empty_result() {
	let harness = harness();

	harness.knowledge.fail_next(2);

	let response = harness
		.service
		.retrieve_guidelines(query("any guidance"))
		.await
		.expect("degradation is not an error");
	let result = response.result;

	assert!(result.degraded);
	assert!(result.items.is_empty());
}

#[tokio::test]
async fn caller_min_relevance_overrides_the_default() {
	let harness = harness();
	let text = "vision screening guidance";
	let embedding = query_embedding(text);

	harness.knowledge.seed(
		approved_document("Relevant", "Guidance text.", OffsetDateTime::now_utc()),
		embedding,
	);

	let strict = GuidelineQuery {
		query: text.to_string(),
		min_relevance: Some(0.999_9),
		top_k: None,
	};
	let response =
		harness.service.retrieve_guidelines(strict).await.expect("retrieval succeeds");

	// The seeded document matches at ~1.0 but float rounding keeps this
	// assertion meaningful for anything less relevant.
	assert!(response.result.items.iter().all(|item| item.relevance >= 0.999_9));
}

#[tokio::test]
async fn fetch_returns_the_full_document_behind_a_hit() {
	let harness = harness();
	let doc = approved_document(
		"Full guidance",
		"The complete guidance text, beyond any snippet.",
		OffsetDateTime::now_utc(),
	);
	let doc_id = doc.doc_id;

	harness.knowledge.seed(doc, query_embedding("full guidance"));

	let response = harness.service.get_guideline(doc_id).await.expect("fetch succeeds");

	assert_eq!(response.document.doc_id, doc_id);
	assert_eq!(response.document.content, "The complete guidance text, beyond any snippet.");

	let err = harness
		.service
		.get_guideline(uuid::Uuid::new_v4())
		.await
		.expect_err("unknown documents are not found");

	assert!(matches!(err, Error::NotFound { .. }), "unexpected error: {err}");
}

#[tokio::test]
async fn blank_query_is_rejected() {
	let harness = harness();
	let err = harness
		.service
		.retrieve_guidelines(query("   "))
		.await
		.expect_err("blank queries must be rejected");

	assert!(matches!(err, Error::InvalidRequest { .. }), "unexpected error: {err}");
}

#[tokio::test]
async fn out_of_range_min_relevance_is_rejected() {
	let harness = harness();
	let err = harness
		.service
		.retrieve_guidelines(GuidelineQuery {
			query: "guidance".to_string(),
			min_relevance: Some(1.5),
			top_k: None,
		})
		.await
		.expect_err("out-of-range thresholds must be rejected");

	assert!(matches!(err, Error::InvalidRequest { .. }), "unexpected error: {err}");
}

use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::time::Instant;
use uuid::Uuid;

use verdict_config::Config;
use verdict_domain::retrieval::{GuidelineHit, RankingExplain, RetrievalResult};
use verdict_storage::models::{KnowledgeDocument, ReviewStatus, SearchHit};

use crate::{Error, ServiceResult, VerdictService};

const SNIPPET_MAX_CHARS: usize = 240;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct GuidelineQuery {
	pub query: String,
	pub min_relevance: Option<f32>,
	pub top_k: Option<u32>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct GuidelineResponse {
	pub result: RetrievalResult,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct GuidelineFetchResponse {
	pub document: KnowledgeDocument,
}

impl VerdictService {
	/// Ranked guideline retrieval under the configured budget. Failures
	/// degrade to an empty result; retrieval is advisory and never fails a
	/// caller.
	pub async fn retrieve_guidelines(&self, req: GuidelineQuery) -> ServiceResult<GuidelineResponse> {
		if req.query.trim().is_empty() {
			return Err(Error::InvalidRequest { message: "query must be non-empty.".to_string() });
		}

		let min_relevance = req.min_relevance.unwrap_or(self.cfg.retrieval.min_relevance);

		if !(0.0..=1.0).contains(&min_relevance) {
			return Err(Error::InvalidRequest {
				message: "min_relevance must be in the range 0.0-1.0.".to_string(),
			});
		}

		let top_k = req.top_k.unwrap_or(self.cfg.retrieval.top_k);
		let result = self
			.run_retrieval(&req.query, min_relevance, top_k, OffsetDateTime::now_utc())
			.await;

		Ok(GuidelineResponse { result })
	}

	/// Full-document lookup for a hit surfaced by retrieval; records carry
	/// only snippets.
	pub async fn get_guideline(&self, doc_id: Uuid) -> ServiceResult<GuidelineFetchResponse> {
		match self.knowledge.fetch(doc_id).await? {
			Some(document) => Ok(GuidelineFetchResponse { document }),
			None => Err(Error::NotFound { message: format!("guideline {doc_id}") }),
		}
	}

	/// One embed + nearest-neighbor round with a single retry inside the
	/// retrieval budget. The second failure yields the degraded empty
	/// result instead of an error.
	pub(crate) async fn run_retrieval(
		&self,
		query: &str,
		min_relevance: f32,
		top_k: u32,
		now: OffsetDateTime,
	) -> RetrievalResult {
		let budget = Duration::from_millis(self.cfg.retrieval.budget_ms);
		let started = Instant::now();

		for attempt in 1..=2_u32 {
			let remaining = budget.saturating_sub(started.elapsed());

			if remaining.is_zero() {
				break;
			}

			match tokio::time::timeout(remaining, self.retrieval_attempt(query, top_k)).await {
				Ok(Ok(hits)) => {
					return rank_hits(&self.cfg, hits, min_relevance, top_k, now);
				},
				Ok(Err(err)) => {
					tracing::warn!(attempt, error = %err, "Guideline retrieval attempt failed.");
				},
				Err(_) => {
					tracing::warn!(attempt, "Guideline retrieval attempt timed out.");
				},
			}
		}

		tracing::warn!(query_chars = query.chars().count(), "Guideline retrieval degraded.");

		RetrievalResult::degraded_empty()
	}

	async fn retrieval_attempt(&self, query: &str, top_k: u32) -> ServiceResult<Vec<SearchHit>> {
		let vectors = self
			.providers
			.embedding
			.embed(&self.cfg.providers.embedding, &[query.to_string()])
			.await?;
		let Some(vector) = vectors.into_iter().next() else {
			return Err(Error::Provider {
				message: "Embedding provider returned no vectors.".to_string(),
			});
		};

		if vector.len() != self.cfg.knowledge.vector_dim as usize {
			return Err(Error::Provider {
				message: "Embedding vector dimension mismatch.".to_string(),
			});
		}

		Ok(self.knowledge.similarity_search(&vector, top_k).await?)
	}
}

/// Filters to approved documents above the relevance threshold, blends
/// relevance with recency, and orders by the blended score with
/// more-recent-first tie-breaks. Duplicate document ids keep their best
/// entry.
fn rank_hits(
	cfg: &Config,
	hits: Vec<SearchHit>,
	min_relevance: f32,
	top_k: u32,
	now: OffsetDateTime,
) -> RetrievalResult {
	let total_weight = cfg.retrieval.relevance_weight + cfg.retrieval.recency_weight;
	let mut ranked: Vec<GuidelineHit> = Vec::with_capacity(hits.len());

	for hit in hits {
		if hit.document.review_status != ReviewStatus::Approved {
			continue;
		}

		let relevance = hit.score.clamp(0.0, 1.0);

		if relevance < min_relevance {
			continue;
		}

		let age_days = ((now - hit.document.last_updated).as_seconds_f32() / 86_400.0).max(0.0);
		let recency_decay = (-age_days / cfg.retrieval.recency_tau_days).exp();
		let relevance_term = cfg.retrieval.relevance_weight * relevance;
		let recency_term = cfg.retrieval.recency_weight * recency_decay;
		let final_score =
			if total_weight > 0.0 { (relevance_term + recency_term) / total_weight } else { 0.0 };

		ranked.push(GuidelineHit {
			doc_id: hit.document.doc_id,
			title: hit.document.title,
			source: hit.document.source,
			snippet: snippet_of(&hit.document.content),
			last_updated: hit.document.last_updated,
			relevance,
			explain: RankingExplain {
				relevance,
				recency_decay,
				relevance_term,
				recency_term,
				final_score,
			},
		});
	}

	ranked.sort_by(|a, b| {
		b.explain
			.final_score
			.total_cmp(&a.explain.final_score)
			.then_with(|| b.last_updated.cmp(&a.last_updated))
			.then_with(|| a.doc_id.cmp(&b.doc_id))
	});

	let mut seen = std::collections::HashSet::new();

	ranked.retain(|hit| seen.insert(hit.doc_id));
	ranked.truncate(top_k as usize);

	RetrievalResult { items: ranked, degraded: false }
}

fn snippet_of(content: &str) -> String {
	if content.chars().count() <= SNIPPET_MAX_CHARS {
		return content.to_string();
	}

	let mut snippet: String = content.chars().take(SNIPPET_MAX_CHARS).collect();

	snippet.push('…');

	snippet
}

#[cfg(test)]
mod tests {
	use time::Duration as TimeDuration;
	use uuid::Uuid;

	use verdict_storage::models::KnowledgeDocument;

	use super::*;

	fn config() -> Config {
		let raw = r#"
			[service]
			http_bind = "127.0.0.1:8080"
			log_level = "info"

			[knowledge]
			url = "http://localhost:6334"
			collection = "guidelines_v1"
			vector_dim = 8

			[providers.embedding]
			provider_id = "p"
			api_base = "http://localhost"
			api_key = "key"
			path = "/v1/embeddings"
			model = "m"
			dimensions = 8
			timeout_ms = 1000
			default_headers = {}

			[providers.extractor]
			provider_id = "p"
			api_base = "http://localhost"
			api_key = "key"
			path = "/v1/chat/completions"
			model = "m"
			temperature = 0.1
			timeout_ms = 2000
			default_headers = {}

			[scoring]
			completeness_floor = 0.5
			max_note_chars = 20000

			[[scoring.categories]]
			name = "communication"
			weight = 1.0
			required_responses = 6

			[scoring.fallback]
			default_score = 60.0

			[retrieval]
			top_k = 10
			min_relevance = 0.6
			relevance_weight = 0.8
			recency_weight = 0.2
			recency_tau_days = 180.0
			budget_ms = 1000

			[security]
			bind_localhost_only = true
		"#;

		toml::from_str(raw).expect("test config must parse")
	}

	fn hit(status: ReviewStatus, score: f32, age_days: i64) -> SearchHit {
		let now = OffsetDateTime::UNIX_EPOCH + TimeDuration::days(1_000);

		SearchHit {
			document: KnowledgeDocument {
				doc_id: Uuid::new_v4(),
				title: "Guidance".to_string(),
				content: "Guidance content.".to_string(),
				source: "aap".to_string(),
				review_status: status,
				last_updated: now - TimeDuration::days(age_days),
			},
			score,
		}
	}

	fn rank(cfg: &Config, hits: Vec<SearchHit>) -> RetrievalResult {
		let now = OffsetDateTime::UNIX_EPOCH + TimeDuration::days(1_000);

		rank_hits(cfg, hits, cfg.retrieval.min_relevance, cfg.retrieval.top_k, now)
	}

	#[test]
	fn non_approved_documents_never_surface() {
		let cfg = config();
		let result = rank(&cfg, vec![
			hit(ReviewStatus::Pending, 0.95, 1),
			hit(ReviewStatus::Rejected, 0.95, 1),
			hit(ReviewStatus::Approved, 0.9, 1),
		]);

		assert_eq!(result.items.len(), 1);
		assert!(!result.degraded);
	}

	#[test]
	fn relevance_below_threshold_is_dropped() {
		let cfg = config();
		let result = rank(&cfg, vec![
			hit(ReviewStatus::Approved, 0.59, 1),
			hit(ReviewStatus::Approved, 0.61, 1),
		]);

		assert_eq!(result.items.len(), 1);
		assert!(result.items[0].relevance >= cfg.retrieval.min_relevance);
	}

	#[test]
	fn recency_breaks_close_relevance_calls() {
		let cfg = config();
		let fresh = hit(ReviewStatus::Approved, 0.8, 1);
		let stale = hit(ReviewStatus::Approved, 0.8, 900);
		let fresh_id = fresh.document.doc_id;
		let result = rank(&cfg, vec![stale, fresh]);

		assert_eq!(result.items.len(), 2);
		assert_eq!(result.items[0].doc_id, fresh_id);
	}

	#[test]
	fn duplicate_document_ids_keep_the_best_entry() {
		let cfg = config();
		let mut first = hit(ReviewStatus::Approved, 0.7, 1);
		let mut second = hit(ReviewStatus::Approved, 0.9, 1);
		let shared = Uuid::new_v4();

		first.document.doc_id = shared;
		second.document.doc_id = shared;

		let result = rank(&cfg, vec![first, second]);

		assert_eq!(result.items.len(), 1);
		assert!((result.items[0].relevance - 0.9).abs() < f32::EPSILON);
	}

	#[test]
	fn ranking_is_deterministic() {
		let cfg = config();
		let hits = vec![
			hit(ReviewStatus::Approved, 0.8, 10),
			hit(ReviewStatus::Approved, 0.75, 2),
			hit(ReviewStatus::Approved, 0.9, 400),
		];
		let first = rank(&cfg, hits.clone());
		let second = rank(&cfg, hits);

		assert_eq!(first, second);
	}
}

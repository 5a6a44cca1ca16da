use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Per-hit ranking breakdown so callers can see why a guideline surfaced.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct RankingExplain {
	pub relevance: f32,
	pub recency_decay: f32,
	pub relevance_term: f32,
	pub recency_term: f32,
	pub final_score: f32,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GuidelineHit {
	pub doc_id: Uuid,
	pub title: String,
	pub source: String,
	pub snippet: String,
	#[serde(with = "time::serde::rfc3339")]
	pub last_updated: OffsetDateTime,
	pub relevance: f32,
	pub explain: RankingExplain,
}

/// Ranked, deduplicated retrieval outcome for one request. `degraded` marks
/// results produced after the knowledge store failed both attempts.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct RetrievalResult {
	pub items: Vec<GuidelineHit>,
	pub degraded: bool,
}
impl RetrievalResult {
	pub fn degraded_empty() -> Self {
		Self { items: Vec::new(), degraded: true }
	}

	pub fn mean_relevance(&self) -> f32 {
		if self.items.is_empty() {
			return 0.0;
		}

		let total: f32 = self.items.iter().map(|item| item.relevance).sum();

		total / self.items.len() as f32
	}
}

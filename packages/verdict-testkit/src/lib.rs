//! Synthetic collaborators for exercising the decision core without live
//! providers or a vector index. Embeddings are deterministic functions of
//! the input text, so seeded documents can be made arbitrarily relevant to a
//! query.

use std::{
	sync::{
		Mutex,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};

use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use verdict_config::{
	Budgets, Cache, Confidence, Config, Disclaimers, EmbeddingProviderConfig,
	ExtractorProviderConfig, FallbackBand, FallbackScoring, Gate, Knowledge, Providers, Retrieval,
	Scoring, ScoringCategory, Security, Service,
};
use verdict_domain::record::DecisionState;
use verdict_service::{
	AuditEvent, AuditSink, BoxFuture, EmbeddingProvider, FeatureExtractor, KnowledgeStore,
};
use verdict_storage::models::{KnowledgeDocument, ReviewStatus, SearchHit};

/// Deterministic embedder: the vector is a pure function of the text, unit
/// length, so identical texts embed to cosine similarity 1.0.
pub struct FixedEmbedder {
	dimensions: u32,
	delay: Option<Duration>,
	calls: AtomicUsize,
}
impl FixedEmbedder {
	pub fn new(dimensions: u32) -> Self {
		Self { dimensions, delay: None, calls: AtomicUsize::new(0) }
	}

	pub fn with_delay(mut self, delay: Duration) -> Self {
		self.delay = Some(delay);

		self
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	pub fn vector_for(dimensions: u32, text: &str) -> Vec<f32> {
		let mut vector = vec![0.0_f32; dimensions as usize];

		for (index, byte) in text.bytes().enumerate() {
			vector[index % dimensions as usize] += f32::from(byte) / 255.0;
		}

		let norm = vector.iter().map(|value| value * value).sum::<f32>().sqrt();

		if norm > 0.0 {
			for value in &mut vector {
				*value /= norm;
			}
		} else if let Some(first) = vector.first_mut() {
			*first = 1.0;
		}

		vector
	}
}
impl EmbeddingProvider for FixedEmbedder {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(async move {
			self.calls.fetch_add(1, Ordering::SeqCst);

			if let Some(delay) = self.delay {
				tokio::time::sleep(delay).await;
			}

			let dimensions = cfg.dimensions.min(self.dimensions).max(1);

			Ok(texts.iter().map(|text| Self::vector_for(dimensions, text)).collect())
		})
	}
}

/// Seedable in-memory knowledge store with failure injection for
/// store-unavailable scenarios.
pub struct MemoryKnowledge {
	documents: Mutex<Vec<(KnowledgeDocument, Vec<f32>)>>,
	failures: AtomicUsize,
	calls: AtomicUsize,
}
impl MemoryKnowledge {
	pub fn new() -> Self {
		Self {
			documents: Mutex::new(Vec::new()),
			failures: AtomicUsize::new(0),
			calls: AtomicUsize::new(0),
		}
	}

	pub fn seed(&self, document: KnowledgeDocument, embedding: Vec<f32>) {
		let mut documents = self.documents.lock().unwrap_or_else(|err| err.into_inner());

		documents.push((document, embedding));
	}

	/// The next `count` search calls fail with `StoreUnavailable`.
	pub fn fail_next(&self, count: usize) {
		self.failures.store(count, Ordering::SeqCst);
	}

	pub fn search_calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	fn take_failure(&self) -> bool {
		self.failures
			.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |remaining| {
				remaining.checked_sub(1)
			})
			.is_ok()
	}
}
impl Default for MemoryKnowledge {
	fn default() -> Self {
		Self::new()
	}
}
impl KnowledgeStore for MemoryKnowledge {
	fn similarity_search<'a>(
		&'a self,
		query: &'a [f32],
		k: u32,
	) -> BoxFuture<'a, verdict_storage::Result<Vec<SearchHit>>> {
		Box::pin(async move {
			self.calls.fetch_add(1, Ordering::SeqCst);

			if self.take_failure() {
				return Err(verdict_storage::Error::StoreUnavailable {
					message: "injected failure".to_string(),
				});
			}

			let documents = self.documents.lock().unwrap_or_else(|err| err.into_inner());
			let mut hits: Vec<SearchHit> = documents
				.iter()
				.map(|(document, embedding)| SearchHit {
					document: document.clone(),
					score: cosine(query, embedding),
				})
				.collect();

			hits.sort_by(|a, b| b.score.total_cmp(&a.score));
			hits.truncate(k as usize);

			Ok(hits)
		})
	}

	fn fetch<'a>(
		&'a self,
		doc_id: Uuid,
	) -> BoxFuture<'a, verdict_storage::Result<Option<KnowledgeDocument>>> {
		Box::pin(async move {
			if self.take_failure() {
				return Err(verdict_storage::Error::StoreUnavailable {
					message: "injected failure".to_string(),
				});
			}

			let documents = self.documents.lock().unwrap_or_else(|err| err.into_inner());

			Ok(documents
				.iter()
				.find(|(document, _)| document.doc_id == doc_id)
				.map(|(document, _)| document.clone()))
		})
	}
}

/// Extractor that replays a canned payload, optionally slowly or failing.
pub struct ScriptedExtractor {
	payload: Option<Value>,
	delay: Option<Duration>,
	calls: AtomicUsize,
}
impl ScriptedExtractor {
	pub fn returning(payload: Value) -> Self {
		Self { payload: Some(payload), delay: None, calls: AtomicUsize::new(0) }
	}

	pub fn failing() -> Self {
		Self { payload: None, delay: None, calls: AtomicUsize::new(0) }
	}

	pub fn with_delay(mut self, delay: Duration) -> Self {
		self.delay = Some(delay);

		self
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl FeatureExtractor for ScriptedExtractor {
	fn extract<'a>(
		&'a self,
		_cfg: &'a ExtractorProviderConfig,
		_categories: &'a [String],
		_note_text: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Value>> {
		Box::pin(async move {
			self.calls.fetch_add(1, Ordering::SeqCst);

			if let Some(delay) = self.delay {
				tokio::time::sleep(delay).await;
			}

			match self.payload.as_ref() {
				Some(payload) => Ok(payload.clone()),
				None => Err(color_eyre::eyre::eyre!("synthetic extractor failure")),
			}
		})
	}
}

/// Captures every emitted audit event for assertions.
#[derive(Default)]
pub struct RecordingAudit {
	events: Mutex<Vec<AuditEvent>>,
}
impl RecordingAudit {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn events(&self) -> Vec<AuditEvent> {
		self.events.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}

	pub fn states(&self) -> Vec<DecisionState> {
		self.events().iter().map(|event| event.state).collect()
	}
}
impl AuditSink for RecordingAudit {
	fn emit(&self, event: AuditEvent) {
		self.events.lock().unwrap_or_else(|err| err.into_inner()).push(event);
	}
}

pub fn approved_document(title: &str, content: &str, last_updated: OffsetDateTime) -> KnowledgeDocument {
	document(title, content, ReviewStatus::Approved, last_updated)
}

pub fn document(
	title: &str,
	content: &str,
	review_status: ReviewStatus,
	last_updated: OffsetDateTime,
) -> KnowledgeDocument {
	KnowledgeDocument {
		doc_id: Uuid::new_v4(),
		title: title.to_string(),
		content: content.to_string(),
		source: "testkit".to_string(),
		review_status,
		last_updated,
	}
}

/// Baseline configuration for tests: three screening domains, default gate
/// thresholds, a tiny vector dimension, and a local-only service section.
pub fn config() -> Config {
	Config {
		service: Service {
			http_bind: "127.0.0.1:8080".to_string(),
			log_level: "info".to_string(),
		},
		knowledge: Knowledge {
			url: "http://localhost:6334".to_string(),
			collection: "guidelines_v1".to_string(),
			vector_dim: 8,
		},
		providers: Providers {
			embedding: EmbeddingProviderConfig {
				provider_id: "testkit".to_string(),
				api_base: "http://localhost".to_string(),
				api_key: "key".to_string(),
				path: "/v1/embeddings".to_string(),
				model: "m".to_string(),
				dimensions: 8,
				timeout_ms: 1_000,
				default_headers: Default::default(),
			},
			extractor: ExtractorProviderConfig {
				provider_id: "testkit".to_string(),
				api_base: "http://localhost".to_string(),
				api_key: "key".to_string(),
				path: "/v1/chat/completions".to_string(),
				model: "m".to_string(),
				temperature: 0.1,
				timeout_ms: 2_000,
				default_headers: Default::default(),
			},
		},
		scoring: Scoring {
			completeness_floor: 0.5,
			max_note_chars: 20_000,
			categories: vec![
				ScoringCategory {
					name: "communication".to_string(),
					weight: 1.0,
					required_responses: 6,
				},
				ScoringCategory {
					name: "gross_motor".to_string(),
					weight: 1.0,
					required_responses: 6,
				},
				ScoringCategory {
					name: "personal_social".to_string(),
					weight: 1.0,
					required_responses: 6,
				},
			],
			fallback: FallbackScoring {
				default_score: 60.0,
				bands: vec![FallbackBand { category: "personal_social".to_string(), score: 75.0 }],
			},
		},
		retrieval: Retrieval {
			top_k: 10,
			min_relevance: 0.6,
			relevance_weight: 0.8,
			recency_weight: 0.2,
			recency_tau_days: 180.0,
			budget_ms: 1_000,
		},
		confidence: Confidence {
			completeness_weight: 1.0,
			relevance_weight: 1.0,
			agreement_weight: 1.0,
		},
		gate: Gate { review_threshold: 0.7, high_risk_threshold: 70.0 },
		budgets: Budgets { screening_ms: 30_000, clinical_note_ms: 120_000 },
		cache: Cache { enabled: true, max_entries: 1_024 },
		disclaimers: Disclaimers { statements: Vec::new() },
		security: Security { bind_localhost_only: true },
	}
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
	if a.len() != b.len() {
		return 0.0;
	}

	let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
	let norm_a = a.iter().map(|value| value * value).sum::<f32>().sqrt();
	let norm_b = b.iter().map(|value| value * value).sum::<f32>().sqrt();

	if norm_a <= 0.0 || norm_b <= 0.0 {
		return 0.0;
	}

	dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn identical_texts_embed_identically() {
		let first = FixedEmbedder::vector_for(8, "developmental screening");
		let second = FixedEmbedder::vector_for(8, "developmental screening");

		assert_eq!(first, second);
		assert!((cosine(&first, &second) - 1.0).abs() < 1e-5);
	}

	#[test]
	fn failure_injection_counts_down() {
		let store = MemoryKnowledge::new();

		store.fail_next(2);

		assert!(store.take_failure());
		assert!(store.take_failure());
		assert!(!store.take_failure());
	}
}

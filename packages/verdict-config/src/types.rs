use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub knowledge: Knowledge,
	pub providers: Providers,
	pub scoring: Scoring,
	pub retrieval: Retrieval,
	#[serde(default)]
	pub confidence: Confidence,
	#[serde(default)]
	pub gate: Gate,
	#[serde(default)]
	pub budgets: Budgets,
	#[serde(default)]
	pub cache: Cache,
	#[serde(default)]
	pub disclaimers: Disclaimers,
	pub security: Security,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Knowledge {
	pub url: String,
	pub collection: String,
	pub vector_dim: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub extractor: ExtractorProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct ExtractorProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct Scoring {
	pub completeness_floor: f32,
	pub max_note_chars: u32,
	pub categories: Vec<ScoringCategory>,
	pub fallback: FallbackScoring,
}

#[derive(Debug, Deserialize)]
pub struct ScoringCategory {
	pub name: String,
	pub weight: f32,
	pub required_responses: u32,
}

#[derive(Debug, Deserialize)]
pub struct FallbackScoring {
	pub default_score: f32,
	#[serde(default)]
	pub bands: Vec<FallbackBand>,
}

#[derive(Debug, Deserialize)]
pub struct FallbackBand {
	pub category: String,
	pub score: f32,
}

#[derive(Debug, Deserialize)]
pub struct Retrieval {
	pub top_k: u32,
	pub min_relevance: f32,
	pub relevance_weight: f32,
	pub recency_weight: f32,
	pub recency_tau_days: f32,
	pub budget_ms: u64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Confidence {
	pub completeness_weight: f32,
	pub relevance_weight: f32,
	pub agreement_weight: f32,
}
impl Default for Confidence {
	fn default() -> Self {
		Self { completeness_weight: 1.0, relevance_weight: 1.0, agreement_weight: 1.0 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Gate {
	pub review_threshold: f32,
	pub high_risk_threshold: f32,
}
impl Default for Gate {
	fn default() -> Self {
		Self { review_threshold: 0.7, high_risk_threshold: 70.0 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Budgets {
	pub screening_ms: u64,
	pub clinical_note_ms: u64,
}
impl Default for Budgets {
	fn default() -> Self {
		Self { screening_ms: 30_000, clinical_note_ms: 120_000 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Cache {
	pub enabled: bool,
	pub max_entries: u32,
}
impl Default for Cache {
	fn default() -> Self {
		Self { enabled: true, max_entries: 1_024 }
	}
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Disclaimers {
	pub statements: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct Security {
	pub bind_localhost_only: bool,
}

pub mod analyze;
pub mod assess;
pub mod audit;
pub mod list;
pub mod retrieve;
pub mod review;

mod cache;
mod pipeline;
mod score;

use std::{future::Future, pin::Pin, sync::Arc};

use serde_json::Value;
use uuid::Uuid;

pub use analyze::{ClinicalInputRequest, ClinicalInputResponse};
pub use assess::{RiskAssessmentRequest, RiskAssessmentResponse};
pub use audit::{AuditEvent, TracingAudit};
pub use list::{DecisionFetchResponse, DecisionListRequest, DecisionListResponse};
pub use retrieve::{GuidelineFetchResponse, GuidelineQuery, GuidelineResponse};
pub use review::{ReviewRequest, ReviewResponse};

use verdict_config::{Config, EmbeddingProviderConfig, ExtractorProviderConfig};
use verdict_domain::intake::RejectCode;
use verdict_providers::{embedding, extractor};
use verdict_storage::{
	decisions::DecisionStore,
	models::{KnowledgeDocument, SearchHit},
	qdrant::QdrantKnowledge,
};

use crate::cache::ResultCache;

pub type ServiceResult<T> = Result<T, Error>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>>;
}

pub trait FeatureExtractor
where
	Self: Send + Sync,
{
	fn extract<'a>(
		&'a self,
		cfg: &'a ExtractorProviderConfig,
		categories: &'a [String],
		note_text: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Value>>;
}

pub trait KnowledgeStore
where
	Self: Send + Sync,
{
	fn similarity_search<'a>(
		&'a self,
		query: &'a [f32],
		k: u32,
	) -> BoxFuture<'a, verdict_storage::Result<Vec<SearchHit>>>;

	fn fetch<'a>(
		&'a self,
		doc_id: Uuid,
	) -> BoxFuture<'a, verdict_storage::Result<Option<KnowledgeDocument>>>;
}

/// Receives one event per decision state transition. Emission is
/// fire-and-forget; the core never owns event storage.
pub trait AuditSink
where
	Self: Send + Sync,
{
	fn emit(&self, event: AuditEvent);
}

#[derive(Debug)]
pub enum Error {
	InsufficientData { completeness: f32, floor: f32 },
	Timeout { elapsed_ms: u64, budget_ms: u64 },
	ReviewProtocol { message: String },
	InvalidRequest { message: String },
	NotFound { message: String },
	Provider { message: String },
	Store { message: String },
	Internal { message: String },
}

impl std::fmt::Display for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::InsufficientData { completeness, floor } => write!(
				f,
				"Insufficient data: completeness {completeness:.2} is below the floor of \
				 {floor:.2}; provide additional input and retry."
			),
			Self::Timeout { elapsed_ms, budget_ms } => {
				write!(f, "Deadline exceeded after {elapsed_ms} ms (budget {budget_ms} ms).")
			},
			Self::ReviewProtocol { message } => write!(f, "Review protocol violation: {message}"),
			Self::InvalidRequest { message } => write!(f, "Invalid request: {message}"),
			Self::NotFound { message } => write!(f, "Not found: {message}"),
			Self::Provider { message } => write!(f, "Provider error: {message}"),
			Self::Store { message } => write!(f, "Storage error: {message}"),
			Self::Internal { message } => write!(f, "Internal error: {message}"),
		}
	}
}

impl std::error::Error for Error {}

impl From<verdict_storage::Error> for Error {
	fn from(err: verdict_storage::Error) -> Self {
		match err {
			verdict_storage::Error::NotFound(message) => Self::NotFound { message },
			verdict_storage::Error::InvalidArgument(message) =>
				Self::InvalidRequest { message },
			err => Self::Store { message: err.to_string() },
		}
	}
}

impl From<color_eyre::Report> for Error {
	fn from(err: color_eyre::Report) -> Self {
		Self::Provider { message: err.to_string() }
	}
}

impl From<verdict_domain::record::InvalidTransition> for Error {
	fn from(err: verdict_domain::record::InvalidTransition) -> Self {
		Self::Internal { message: err.to_string() }
	}
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub extractor: Arc<dyn FeatureExtractor>,
}

pub struct VerdictService {
	pub cfg: Config,
	pub decisions: DecisionStore,
	pub knowledge: Arc<dyn KnowledgeStore>,
	pub providers: Providers,
	pub audit: Arc<dyn AuditSink>,
	pub(crate) cache: ResultCache,
}

struct DefaultProviders;

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}

impl FeatureExtractor for DefaultProviders {
	fn extract<'a>(
		&'a self,
		cfg: &'a ExtractorProviderConfig,
		categories: &'a [String],
		note_text: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<Value>> {
		Box::pin(extractor::extract(cfg, categories, note_text))
	}
}

impl KnowledgeStore for QdrantKnowledge {
	fn similarity_search<'a>(
		&'a self,
		query: &'a [f32],
		k: u32,
	) -> BoxFuture<'a, verdict_storage::Result<Vec<SearchHit>>> {
		Box::pin(Self::similarity_search(self, query, k))
	}

	fn fetch<'a>(
		&'a self,
		doc_id: Uuid,
	) -> BoxFuture<'a, verdict_storage::Result<Option<KnowledgeDocument>>> {
		Box::pin(Self::fetch(self, doc_id))
	}
}

impl Providers {
	pub fn new(embedding: Arc<dyn EmbeddingProvider>, extractor: Arc<dyn FeatureExtractor>) -> Self {
		Self { embedding, extractor }
	}
}

impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);
		Self { embedding: provider.clone(), extractor: provider }
	}
}

impl VerdictService {
	pub fn new(cfg: Config, knowledge: QdrantKnowledge) -> Self {
		Self::with_collaborators(
			cfg,
			Arc::new(knowledge),
			Providers::default(),
			Arc::new(TracingAudit),
		)
	}

	pub fn with_collaborators(
		cfg: Config,
		knowledge: Arc<dyn KnowledgeStore>,
		providers: Providers,
		audit: Arc<dyn AuditSink>,
	) -> Self {
		let cache = ResultCache::new(&cfg.cache);

		Self { cfg, decisions: DecisionStore::new(), knowledge, providers, audit, cache }
	}
}

pub(crate) fn reject_reason_code(code: RejectCode) -> &'static str {
	match code {
		RejectCode::RejectEmpty => "REJECT_EMPTY",
		RejectCode::RejectTooLong => "REJECT_TOO_LONG",
		RejectCode::RejectNoResponses => "REJECT_NO_RESPONSES",
		RejectCode::RejectUnknownCategory => "REJECT_UNKNOWN_CATEGORY",
	}
}

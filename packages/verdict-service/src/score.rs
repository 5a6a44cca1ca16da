use serde_json::Value;

use verdict_domain::scoring::{self, ClinicalFeature, ScoreResult, ScreeningResponse};

use crate::{Error, ServiceResult, VerdictService};

pub(crate) enum ScoringInput {
	Screening(Vec<ScreeningResponse>),
	ClinicalNote(String),
}

impl ScoringInput {
	/// Deterministic retrieval query derived from the input alone; it cannot
	/// depend on scores because retrieval runs concurrently with scoring.
	pub(crate) fn retrieval_query(&self, cfg: &verdict_config::Config) -> String {
		match self {
			Self::Screening(responses) => {
				let mut categories: Vec<&str> = cfg
					.scoring
					.categories
					.iter()
					.map(|category| category.name.as_str())
					.filter(|name| {
						responses.iter().any(|response| response.category == *name)
					})
					.collect();

				if categories.is_empty() {
					categories =
						cfg.scoring.categories.iter().map(|c| c.name.as_str()).collect();
				}

				format!("developmental screening guidance for {}", categories.join(", "))
			},
			Self::ClinicalNote(text) => {
				let head: String = text.chars().take(512).collect();

				format!("clinical guidance for: {head}")
			},
		}
	}
}

impl VerdictService {
	/// Scoring engine entry point. Provider failures bubble up as
	/// `Error::Provider`; the orchestrator decides whether to fall back.
	pub(crate) async fn run_scoring(&self, input: &ScoringInput) -> ServiceResult<ScoreResult> {
		match input {
			ScoringInput::Screening(responses) => {
				Ok(scoring::score_screening(&self.cfg, responses))
			},
			ScoringInput::ClinicalNote(text) => {
				let categories: Vec<String> = self
					.cfg
					.scoring
					.categories
					.iter()
					.map(|category| category.name.clone())
					.collect();
				let raw = self
					.providers
					.extractor
					.extract(&self.cfg.providers.extractor, &categories, text)
					.await?;
				let features = parse_features(&raw)?;

				Ok(scoring::score_features(&self.cfg, &features))
			},
		}
	}
}

/// Interprets extractor JSON. Individual malformed entries are dropped; a
/// payload without a `features` array is a provider fault.
fn parse_features(raw: &Value) -> ServiceResult<Vec<ClinicalFeature>> {
	let entries = raw.get("features").and_then(|value| value.as_array()).ok_or_else(|| {
		Error::Provider { message: "Extractor payload is missing the features array.".to_string() }
	})?;
	let mut features = Vec::with_capacity(entries.len());

	for entry in entries {
		let Some(category) = entry.get("category").and_then(|value| value.as_str()) else {
			continue;
		};
		let Some(severity) = entry.get("severity").and_then(|value| value.as_f64()) else {
			continue;
		};
		let observation =
			entry.get("observation").and_then(|value| value.as_str()).unwrap_or_default();

		features.push(ClinicalFeature {
			category: category.to_string(),
			observation: observation.to_string(),
			severity: severity as f32,
		});
	}

	Ok(features)
}

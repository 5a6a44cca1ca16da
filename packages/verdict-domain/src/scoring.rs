use serde::{Deserialize, Serialize};

use verdict_config::Config;

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMethod {
	/// Deterministic weighted-sum scoring over the configured categories.
	Weighted,
	/// Fixed lookup-table scores used when the primary scorer failed.
	FallbackRules,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CategoryScore {
	pub category: String,
	pub score: f32,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ScoreResult {
	pub raw_score: f32,
	pub category_scores: Vec<CategoryScore>,
	pub data_completeness: f32,
	pub method: ScoringMethod,
}

/// One answered (or skipped) screening question. A missing or non-finite
/// value counts as unanswered and lowers completeness; it never aborts the
/// computation.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ScreeningResponse {
	pub question_id: String,
	pub category: String,
	pub value: Option<f32>,
	pub max_value: f32,
}

/// Structured observation extracted from a clinical note. Severity is
/// clamped to [0, 1]; non-finite severities are treated as absent.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ClinicalFeature {
	pub category: String,
	pub observation: String,
	pub severity: f32,
}

pub fn score_screening(cfg: &Config, responses: &[ScreeningResponse]) -> ScoreResult {
	let mut category_scores = Vec::new();
	let mut answered_required = 0_u32;
	let mut total_required = 0_u32;

	for category in &cfg.scoring.categories {
		total_required += category.required_responses;

		let mut answered = 0_u32;
		let mut sum = 0.0_f32;

		for response in responses.iter().filter(|response| response.category == category.name) {
			let Some(value) = response.value.filter(|value| value.is_finite()) else {
				continue;
			};

			if !response.max_value.is_finite() || response.max_value <= 0.0 {
				continue;
			}

			sum += ((value / response.max_value) * 100.0).clamp(0.0, 100.0);
			answered += 1;
		}

		answered_required += answered.min(category.required_responses);

		if answered > 0 {
			category_scores.push(CategoryScore {
				category: category.name.clone(),
				score: (sum / answered as f32).clamp(0.0, 100.0),
			});
		}
	}

	let data_completeness = if total_required == 0 {
		0.0
	} else {
		answered_required as f32 / total_required as f32
	};

	ScoreResult {
		raw_score: combine(cfg, &category_scores),
		category_scores,
		data_completeness: data_completeness.clamp(0.0, 1.0),
		method: ScoringMethod::Weighted,
	}
}

pub fn score_features(cfg: &Config, features: &[ClinicalFeature]) -> ScoreResult {
	let mut category_scores = Vec::new();
	let mut covered = 0_u32;

	for category in &cfg.scoring.categories {
		let mut observed = 0_u32;
		let mut sum = 0.0_f32;

		for feature in features.iter().filter(|feature| feature.category == category.name) {
			if !feature.severity.is_finite() {
				continue;
			}

			sum += feature.severity.clamp(0.0, 1.0) * 100.0;
			observed += 1;
		}

		if observed > 0 {
			covered += 1;
			category_scores.push(CategoryScore {
				category: category.name.clone(),
				score: (sum / observed as f32).clamp(0.0, 100.0),
			});
		}
	}

	let data_completeness = if cfg.scoring.categories.is_empty() {
		0.0
	} else {
		covered as f32 / cfg.scoring.categories.len() as f32
	};

	ScoreResult {
		raw_score: combine(cfg, &category_scores),
		category_scores,
		data_completeness: data_completeness.clamp(0.0, 1.0),
		method: ScoringMethod::Weighted,
	}
}

/// Rule-based minimal scorer: conservative fixed bands, no model involvement.
pub fn score_fallback(cfg: &Config) -> ScoreResult {
	let category_scores = cfg
		.scoring
		.categories
		.iter()
		.map(|category| CategoryScore {
			category: category.name.clone(),
			score: cfg
				.scoring
				.fallback
				.bands
				.iter()
				.find(|band| band.category == category.name)
				.map(|band| band.score)
				.unwrap_or(cfg.scoring.fallback.default_score)
				.clamp(0.0, 100.0),
		})
		.collect::<Vec<_>>();

	ScoreResult {
		raw_score: combine(cfg, &category_scores),
		category_scores,
		data_completeness: 0.0,
		method: ScoringMethod::FallbackRules,
	}
}

fn combine(cfg: &Config, category_scores: &[CategoryScore]) -> f32 {
	let mut weighted = 0.0_f32;
	let mut total_weight = 0.0_f32;

	for entry in category_scores {
		let Some(category) =
			cfg.scoring.categories.iter().find(|category| category.name == entry.category)
		else {
			continue;
		};

		weighted += entry.score * category.weight;
		total_weight += category.weight;
	}

	if total_weight <= 0.0 {
		return 0.0;
	}

	(weighted / total_weight).clamp(0.0, 100.0)
}

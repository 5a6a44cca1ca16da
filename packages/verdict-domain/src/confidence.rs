use serde::{Deserialize, Serialize};

use verdict_config::Config;

use crate::{retrieval::RetrievalResult, scoring::ScoreResult};

pub const FACTOR_DATA_COMPLETENESS: &str = "data_completeness";
pub const FACTOR_RETRIEVAL_RELEVANCE: &str = "retrieval_relevance";
pub const FACTOR_SCORE_AGREEMENT: &str = "score_agreement";

/// Largest possible standard deviation of values bounded to [0, 100]; used
/// to normalize dispersion into [0, 1].
const MAX_CATEGORY_STDDEV: f32 = 50.0;

/// One itemized contributor to the overall confidence. Collected in
/// computation order; that order is part of the reproducibility contract.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ConfidenceFactor {
	pub name: String,
	pub weight: f32,
	pub contribution: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConfidenceBreakdown {
	pub confidence: f32,
	pub factors: Vec<ConfidenceFactor>,
	pub completeness: f32,
	pub mean_relevance: f32,
	pub agreement: f32,
}

/// Fuses data completeness, retrieval relevance, and category agreement into
/// one confidence level. Never fails; partial inputs yield best-effort
/// values.
pub fn compose(cfg: &Config, score: &ScoreResult, retrieval: &RetrievalResult) -> ConfidenceBreakdown {
	let completeness = score.data_completeness.clamp(0.0, 1.0);
	let mean_relevance =
		if retrieval.degraded { 0.0 } else { retrieval.mean_relevance().clamp(0.0, 1.0) };
	let agreement = agreement_of(score);

	let total_weight = cfg.confidence.completeness_weight
		+ cfg.confidence.relevance_weight
		+ cfg.confidence.agreement_weight;
	let mut factors = Vec::with_capacity(3);
	let mut confidence = 0.0_f32;

	for (name, weight, value) in [
		(FACTOR_DATA_COMPLETENESS, cfg.confidence.completeness_weight, completeness),
		(FACTOR_RETRIEVAL_RELEVANCE, cfg.confidence.relevance_weight, mean_relevance),
		(FACTOR_SCORE_AGREEMENT, cfg.confidence.agreement_weight, agreement),
	] {
		let normalized = if total_weight > 0.0 { weight / total_weight } else { 0.0 };
		let contribution = normalized * value;

		confidence += contribution;

		factors.push(ConfidenceFactor {
			name: name.to_string(),
			weight: normalized,
			contribution,
		});
	}

	ConfidenceBreakdown {
		confidence: confidence.clamp(0.0, 1.0),
		factors,
		completeness,
		mean_relevance,
		agreement,
	}
}

fn agreement_of(score: &ScoreResult) -> f32 {
	let scores = &score.category_scores;

	if scores.len() < 2 {
		return 1.0;
	}

	let mean: f32 = scores.iter().map(|entry| entry.score).sum::<f32>() / scores.len() as f32;
	let variance: f32 = scores.iter().map(|entry| (entry.score - mean).powi(2)).sum::<f32>()
		/ scores.len() as f32;
	let dispersion = (variance.sqrt() / MAX_CATEGORY_STDDEV).clamp(0.0, 1.0);

	1.0 - dispersion
}

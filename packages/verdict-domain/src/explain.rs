use verdict_config::Config;

use crate::{
	confidence::ConfidenceBreakdown,
	retrieval::RetrievalResult,
	scoring::{ScoreResult, ScoringMethod},
};

/// Appended to every decision returned to a caller, regardless of
/// confidence.
pub const DISCLAIMER_HUMAN_AUTHORITY: &str = "This assessment is a decision-support aid, not a \
	medical diagnosis. A qualified clinician must review the result and remains responsible for \
	any final decision.";

pub struct ExplainArgs<'a> {
	pub cfg: &'a Config,
	pub score: &'a ScoreResult,
	pub retrieval: &'a RetrievalResult,
	pub breakdown: &'a ConfidenceBreakdown,
}

/// Builds the ordered explanation for a decision. Statement order follows
/// the confidence factors' computation order, then the score summary, then
/// conditional review and degradation notes. Identical inputs always yield
/// identical statements.
pub fn build_statements(args: ExplainArgs<'_>) -> Vec<String> {
	let ExplainArgs { cfg, score, retrieval, breakdown } = args;
	let mut statements = Vec::new();

	statements.push(format!(
		"Data completeness reached {:.0}% of the required inputs.",
		breakdown.completeness * 100.0,
	));
	statements.push(retrieval_statement(retrieval, breakdown));
	statements.push(format!(
		"Category scores agreed with a consistency of {:.2} across {} scored domains.",
		breakdown.agreement,
		score.category_scores.len(),
	));
	statements.push(format!(
		"The combined risk score is {:.1} out of 100 using {}.",
		score.raw_score,
		match score.method {
			ScoringMethod::Weighted => "weighted category scoring",
			ScoringMethod::FallbackRules => "rule-based fallback scoring",
		},
	));

	if score.raw_score > cfg.gate.high_risk_threshold {
		statements.push(format!(
			"The score exceeds the high-risk threshold of {:.1}; clinician review is required.",
			cfg.gate.high_risk_threshold,
		));
	}
	if breakdown.confidence < cfg.gate.review_threshold {
		statements.push(format!(
			"Confidence {:.2} is below the review threshold of {:.2}; clinician review is \
			 required.",
			breakdown.confidence, cfg.gate.review_threshold,
		));
	}
	if score.method == ScoringMethod::FallbackRules {
		statements.push(
			"The primary scoring engine was unavailable; conservative fallback scores were \
			 applied and review is mandatory."
				.to_string(),
		);
	}

	statements
}

pub fn build_disclaimers(cfg: &Config) -> Vec<String> {
	let mut disclaimers = Vec::with_capacity(1 + cfg.disclaimers.statements.len());

	disclaimers.push(DISCLAIMER_HUMAN_AUTHORITY.to_string());
	disclaimers.extend(cfg.disclaimers.statements.iter().cloned());

	disclaimers
}

fn retrieval_statement(retrieval: &RetrievalResult, breakdown: &ConfidenceBreakdown) -> String {
	if retrieval.degraded {
		return "Guideline retrieval was unavailable; the assessment proceeded without \
			supporting documents."
			.to_string();
	}
	if retrieval.items.is_empty() {
		return "No guideline passed the relevance threshold; retrieval contributed no \
			confidence."
			.to_string();
	}
	if retrieval.items.len() == 1 {
		return format!(
			"Retrieved 1 supporting guideline with a relevance of {:.2}.",
			breakdown.mean_relevance,
		);
	}

	format!(
		"Retrieved {} supporting guidelines with a mean relevance of {:.2}.",
		retrieval.items.len(),
		breakdown.mean_relevance,
	)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		confidence,
		scoring::{CategoryScore, ScoringMethod},
		testcfg,
	};

	fn score(raw: f32, method: ScoringMethod) -> ScoreResult {
		ScoreResult {
			raw_score: raw,
			category_scores: vec![
				CategoryScore { category: "communication".to_string(), score: raw },
				CategoryScore { category: "gross_motor".to_string(), score: raw },
			],
			data_completeness: 1.0,
			method,
		}
	}

	#[test]
	fn statements_are_never_empty_and_deterministic() {
		let cfg = testcfg::config();
		let result = score(42.0, ScoringMethod::Weighted);
		let retrieval = RetrievalResult::default();
		let breakdown = confidence::compose(&cfg, &result, &retrieval);
		let args = || ExplainArgs {
			cfg: &cfg,
			score: &result,
			retrieval: &retrieval,
			breakdown: &breakdown,
		};
		let first = build_statements(args());
		let second = build_statements(args());

		assert!(!first.is_empty());
		assert_eq!(first, second);
	}

	#[test]
	fn high_risk_adds_a_review_statement() {
		let cfg = testcfg::config();
		let result = score(85.0, ScoringMethod::Weighted);
		let retrieval = RetrievalResult::default();
		let breakdown = confidence::compose(&cfg, &result, &retrieval);
		let statements = build_statements(ExplainArgs {
			cfg: &cfg,
			score: &result,
			retrieval: &retrieval,
			breakdown: &breakdown,
		});

		assert!(
			statements.iter().any(|statement| statement.contains("high-risk threshold")),
			"missing high-risk statement: {statements:?}"
		);
	}

	#[test]
	fn fallback_scoring_is_called_out() {
		let cfg = testcfg::config();
		let result = score(60.0, ScoringMethod::FallbackRules);
		let retrieval = RetrievalResult::degraded_empty();
		let breakdown = confidence::compose(&cfg, &result, &retrieval);
		let statements = build_statements(ExplainArgs {
			cfg: &cfg,
			score: &result,
			retrieval: &retrieval,
			breakdown: &breakdown,
		});

		assert!(statements.iter().any(|statement| statement.contains("fallback scores")));
		assert!(statements.iter().any(|statement| statement.contains("retrieval was unavailable")));
	}

	#[test]
	fn disclaimers_always_lead_with_the_human_authority_notice() {
		let mut cfg = testcfg::config();

		cfg.disclaimers.statements = vec!["Site-specific note.".to_string()];

		let disclaimers = build_disclaimers(&cfg);

		assert_eq!(disclaimers.len(), 2);
		assert_eq!(disclaimers[0], DISCLAIMER_HUMAN_AUTHORITY);
		assert_eq!(disclaimers[1], "Site-specific note.");
	}
}

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use verdict_config::Config;

use crate::record::{DecisionRecord, DecisionState, InvalidTransition, ReviewOutcome};

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewReason {
	LowConfidence,
	HighRisk,
	DegradedScoring,
}

#[derive(Clone, Debug, PartialEq)]
pub enum GateRouting {
	AutoAcceptable,
	NeedsReview { reasons: Vec<ReviewReason> },
}

/// Routes an explained decision. High-risk scores require review even at
/// high confidence, and fallback-scored (degraded) decisions always require
/// review.
pub fn route(cfg: &Config, confidence: f32, raw_score: f32, degraded: bool) -> GateRouting {
	let mut reasons = Vec::new();

	if confidence < cfg.gate.review_threshold {
		reasons.push(ReviewReason::LowConfidence);
	}
	if raw_score > cfg.gate.high_risk_threshold {
		reasons.push(ReviewReason::HighRisk);
	}
	if degraded {
		reasons.push(ReviewReason::DegradedScoring);
	}

	if reasons.is_empty() {
		GateRouting::AutoAcceptable
	} else {
		GateRouting::NeedsReview { reasons }
	}
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GateViolation {
	/// A verdict arrived for a decision that is not awaiting review. The
	/// record is left untouched; concurrent submissions resolve
	/// single-winner through this guard.
	NotAwaitingReview { state: DecisionState },
	BlankReviewer,
}
impl std::fmt::Display for GateViolation {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::NotAwaitingReview { state } => {
				write!(f, "Decision is in state {} and does not accept verdicts.", state.as_str())
			},
			Self::BlankReviewer => write!(f, "Review verdicts require a non-blank reviewer id."),
		}
	}
}
impl std::error::Error for GateViolation {}

impl From<InvalidTransition> for GateViolation {
	fn from(err: InvalidTransition) -> Self {
		Self::NotAwaitingReview { state: err.from }
	}
}

/// Applies a human verdict to a decision awaiting review, moving it to
/// `Reviewed`. The original score is preserved; an override is recorded
/// beside it.
pub fn apply_verdict(
	record: &mut DecisionRecord,
	outcome: ReviewOutcome,
	now: OffsetDateTime,
) -> Result<(), GateViolation> {
	if outcome.reviewer_id.trim().is_empty() {
		return Err(GateViolation::BlankReviewer);
	}
	if record.state != DecisionState::NeedsReview {
		return Err(GateViolation::NotAwaitingReview { state: record.state });
	}

	record.transition(DecisionState::Reviewed)?;

	record.reviewed_by = Some(outcome.reviewer_id.clone());
	record.reviewed_at = Some(now);
	record.review = Some(outcome);

	Ok(())
}

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use verdict_domain::{
	gate::{self, GateViolation},
	record::{DecisionRecord, DecisionState, ReviewOutcome, ReviewVerdict},
};

use crate::{Error, ServiceResult, VerdictService, audit};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ReviewRequest {
	pub decision_id: Uuid,
	pub reviewer_id: String,
	pub verdict: ReviewVerdict,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ReviewResponse {
	pub decision: DecisionRecord,
}

impl VerdictService {
	/// Applies a human verdict to a decision awaiting review and finalizes
	/// it. Verdicts for decisions in any other state are rejected without a
	/// state change; concurrent submissions resolve single-winner under the
	/// store's write lock.
	pub async fn submit_review_verdict(&self, req: ReviewRequest) -> ServiceResult<ReviewResponse> {
		if let ReviewVerdict::Override { raw_score } = req.verdict
			&& !(0.0..=100.0).contains(&raw_score)
		{
			return Err(Error::InvalidRequest {
				message: "override raw_score must be in the range 0.0-100.0.".to_string(),
			});
		}

		let now = OffsetDateTime::now_utc();
		let outcome = ReviewOutcome {
			verdict: req.verdict,
			reviewer_id: req.reviewer_id.clone(),
			submitted_at: now,
		};
		let applied = self.decisions.update(req.decision_id, |record| {
			gate::apply_verdict(record, outcome, now)?;
			record.transition(DecisionState::Finalized).map_err(GateViolation::from)?;

			Ok::<(), GateViolation>(())
		})?;

		match applied {
			Ok(((), decision)) => {
				for state in [DecisionState::Reviewed, DecisionState::Finalized] {
					let mut event =
						audit::transition_event(&decision, req.reviewer_id.as_str(), now);

					event.state = state;

					self.audit.emit(event);
				}

				tracing::info!(
					decision_id = %decision.id,
					reviewer = %req.reviewer_id,
					"Review verdict applied."
				);

				Ok(ReviewResponse { decision })
			},
			Err(GateViolation::BlankReviewer) => Err(Error::InvalidRequest {
				message: GateViolation::BlankReviewer.to_string(),
			}),
			Err(violation) => Err(Error::ReviewProtocol { message: violation.to_string() }),
		}
	}
}

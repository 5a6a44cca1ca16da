use serde::{Deserialize, Serialize};
use uuid::Uuid;

use verdict_domain::record::{DecisionRecord, DecisionState};

use crate::{ServiceResult, VerdictService};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DecisionFetchResponse {
	pub decision: DecisionRecord,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct DecisionListRequest {
	pub state: Option<DecisionState>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DecisionListResponse {
	pub decisions: Vec<DecisionRecord>,
}

impl VerdictService {
	pub async fn get_decision(&self, decision_id: Uuid) -> ServiceResult<DecisionFetchResponse> {
		let decision = self.decisions.get(decision_id)?;

		Ok(DecisionFetchResponse { decision })
	}

	/// Lists decisions, optionally filtered by state. A review queue polls
	/// this with `state = NEEDS_REVIEW`.
	pub async fn list_decisions(
		&self,
		req: DecisionListRequest,
	) -> ServiceResult<DecisionListResponse> {
		Ok(DecisionListResponse { decisions: self.decisions.list(req.state) })
	}
}

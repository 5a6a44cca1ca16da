use serde::{Deserialize, Serialize};
use uuid::Uuid;

use verdict_domain::{
	intake,
	record::{DecisionRecord, PayloadKind, RequestContext},
	scoring::ScreeningResponse,
};

use crate::{Error, ServiceResult, VerdictService, cache, score::ScoringInput};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RiskAssessmentRequest {
	pub requester_role: String,
	pub patient_ref: String,
	pub deadline_ms: Option<u64>,
	pub responses: Vec<ScreeningResponse>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RiskAssessmentResponse {
	pub decision: DecisionRecord,
}

impl VerdictService {
	/// Scores a structured screening under the screening SLA and returns
	/// the gated decision record.
	pub async fn compute_risk_assessment(
		&self,
		req: RiskAssessmentRequest,
	) -> ServiceResult<RiskAssessmentResponse> {
		validate_assessment_identity(&req.requester_role, &req.patient_ref)?;

		if let Err(code) = intake::screening_intake(&req.responses, &self.cfg) {
			return Err(Error::InvalidRequest {
				message: format!(
					"screening payload rejected: {}.",
					crate::reject_reason_code(code),
				),
			});
		}

		let cache_key = if self.cfg.cache.enabled {
			Some(cache::screening_cache_key(&req.patient_ref, &req.responses)?)
		} else {
			None
		};
		let ctx = RequestContext {
			request_id: Uuid::new_v4(),
			requester_role: req.requester_role,
			patient_ref: req.patient_ref,
			payload_kind: PayloadKind::Screening,
			deadline_ms: req.deadline_ms,
		};
		let decision = self
			.run_assessment(ctx, ScoringInput::Screening(req.responses), cache_key)
			.await?;

		Ok(RiskAssessmentResponse { decision })
	}
}

pub(crate) fn validate_assessment_identity(
	requester_role: &str,
	patient_ref: &str,
) -> ServiceResult<()> {
	if requester_role.trim().is_empty() || patient_ref.trim().is_empty() {
		return Err(Error::InvalidRequest {
			message: "requester_role and patient_ref are required.".to_string(),
		});
	}

	Ok(())
}

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use verdict_domain::{
	intake,
	record::{DecisionRecord, PayloadKind, RequestContext},
};

use crate::{
	Error, ServiceResult, VerdictService, assess::validate_assessment_identity, cache,
	score::ScoringInput,
};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ClinicalInputRequest {
	pub requester_role: String,
	pub patient_ref: String,
	pub deadline_ms: Option<u64>,
	pub note_text: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ClinicalInputResponse {
	pub decision: DecisionRecord,
}

impl VerdictService {
	/// Extracts structured features from a clinical note, scores them under
	/// the clinical-note SLA, and returns the gated decision record. The
	/// extraction stage dominates the budget.
	pub async fn analyze_clinical_input(
		&self,
		req: ClinicalInputRequest,
	) -> ServiceResult<ClinicalInputResponse> {
		validate_assessment_identity(&req.requester_role, &req.patient_ref)?;

		if let Err(code) = intake::note_intake(&req.note_text, &self.cfg) {
			return Err(Error::InvalidRequest {
				message: format!(
					"clinical note rejected: {}.",
					crate::reject_reason_code(code),
				),
			});
		}

		let cache_key = if self.cfg.cache.enabled {
			Some(cache::note_cache_key(&req.patient_ref, &req.note_text)?)
		} else {
			None
		};
		let ctx = RequestContext {
			request_id: Uuid::new_v4(),
			requester_role: req.requester_role,
			patient_ref: req.patient_ref,
			payload_kind: PayloadKind::ClinicalNote,
			deadline_ms: req.deadline_ms,
		};
		let decision = self
			.run_assessment(ctx, ScoringInput::ClinicalNote(req.note_text), cache_key)
			.await?;

		Ok(ClinicalInputResponse { decision })
	}
}

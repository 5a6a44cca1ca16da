use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{confidence::ConfidenceFactor, retrieval::RetrievalResult, scoring::ScoreResult};

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
	Screening,
	ClinicalNote,
	CareProfile,
}
impl PayloadKind {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Screening => "screening",
			Self::ClinicalNote => "clinical_note",
			Self::CareProfile => "care_profile",
		}
	}
}

/// Immutable description of one assessment request.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RequestContext {
	pub request_id: Uuid,
	pub requester_role: String,
	pub patient_ref: String,
	pub payload_kind: PayloadKind,
	/// Caller-supplied deadline override. The payload-kind budget applies
	/// when absent; the smaller of the two governs when present.
	pub deadline_ms: Option<u64>,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionState {
	Pending,
	Scored,
	Explained,
	AutoAcceptable,
	NeedsReview,
	Reviewed,
	Finalized,
	Failed,
}
impl DecisionState {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Pending => "PENDING",
			Self::Scored => "SCORED",
			Self::Explained => "EXPLAINED",
			Self::AutoAcceptable => "AUTO_ACCEPTABLE",
			Self::NeedsReview => "NEEDS_REVIEW",
			Self::Reviewed => "REVIEWED",
			Self::Finalized => "FINALIZED",
			Self::Failed => "FAILED",
		}
	}

	pub const fn is_terminal(self) -> bool {
		matches!(self, Self::Finalized | Self::Failed)
	}

	pub fn can_transition(self, next: Self) -> bool {
		if next == Self::Failed {
			return !self.is_terminal();
		}

		matches!(
			(self, next),
			(Self::Pending, Self::Scored)
				| (Self::Scored, Self::Explained)
				| (Self::Explained, Self::AutoAcceptable)
				| (Self::Explained, Self::NeedsReview)
				| (Self::AutoAcceptable, Self::Reviewed)
				| (Self::AutoAcceptable, Self::Finalized)
				| (Self::NeedsReview, Self::Reviewed)
				| (Self::Reviewed, Self::Finalized)
		)
	}
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReviewVerdict {
	Approve,
	/// The reviewer replaces the effective score; the original
	/// `ScoreResult` stays on the record untouched.
	Override { raw_score: f32 },
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ReviewOutcome {
	pub verdict: ReviewVerdict,
	pub reviewer_id: String,
	#[serde(with = "time::serde::rfc3339")]
	pub submitted_at: OffsetDateTime,
}

/// The central decision artifact. Created in `Pending`, mutated only through
/// state transitions, immutable once a terminal state is reached.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DecisionRecord {
	pub id: Uuid,
	pub context: RequestContext,
	pub score: Option<ScoreResult>,
	pub retrieval: Option<RetrievalResult>,
	pub confidence: Option<f32>,
	pub factors: Vec<ConfidenceFactor>,
	pub explanation: Vec<String>,
	pub disclaimers: Vec<String>,
	pub state: DecisionState,
	pub degraded: bool,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
	pub reviewed_by: Option<String>,
	#[serde(with = "time::serde::rfc3339::option")]
	pub reviewed_at: Option<OffsetDateTime>,
	pub review: Option<ReviewOutcome>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct InvalidTransition {
	pub from: DecisionState,
	pub to: DecisionState,
}
impl std::fmt::Display for InvalidTransition {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "Invalid decision transition {} -> {}.", self.from.as_str(), self.to.as_str())
	}
}
impl std::error::Error for InvalidTransition {}

impl DecisionRecord {
	pub fn new(context: RequestContext, now: OffsetDateTime) -> Self {
		Self {
			id: Uuid::new_v4(),
			context,
			score: None,
			retrieval: None,
			confidence: None,
			factors: Vec::new(),
			explanation: Vec::new(),
			disclaimers: Vec::new(),
			state: DecisionState::Pending,
			degraded: false,
			created_at: now,
			reviewed_by: None,
			reviewed_at: None,
			review: None,
		}
	}

	pub fn transition(&mut self, next: DecisionState) -> Result<(), InvalidTransition> {
		if !self.state.can_transition(next) {
			return Err(InvalidTransition { from: self.state, to: next });
		}

		self.state = next;

		Ok(())
	}
}

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use verdict_domain::record::{DecisionRecord, DecisionState};

use crate::AuditSink;

/// One audit event per decision state transition.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AuditEvent {
	pub decision_id: Uuid,
	pub state: DecisionState,
	pub actor: String,
	#[serde(with = "time::serde::rfc3339")]
	pub at: OffsetDateTime,
	pub inputs_summary: String,
	pub outputs_summary: String,
	pub degraded: bool,
}

/// Default sink: events go to the structured log. Deployments that need
/// durable audit storage inject their own sink.
pub struct TracingAudit;

impl AuditSink for TracingAudit {
	fn emit(&self, event: AuditEvent) {
		tracing::info!(
			decision_id = %event.decision_id,
			state = event.state.as_str(),
			actor = %event.actor,
			degraded = event.degraded,
			inputs = %event.inputs_summary,
			outputs = %event.outputs_summary,
			"Decision state transition."
		);
	}
}

pub(crate) fn transition_event(
	record: &DecisionRecord,
	actor: &str,
	now: OffsetDateTime,
) -> AuditEvent {
	AuditEvent {
		decision_id: record.id,
		state: record.state,
		actor: actor.to_string(),
		at: now,
		inputs_summary: inputs_summary(record),
		outputs_summary: outputs_summary(record),
		degraded: record.degraded,
	}
}

pub(crate) fn failure_event(
	decision_id: Uuid,
	context_summary: String,
	actor: &str,
	now: OffsetDateTime,
) -> AuditEvent {
	AuditEvent {
		decision_id,
		state: DecisionState::Failed,
		actor: actor.to_string(),
		at: now,
		inputs_summary: context_summary,
		outputs_summary: "no decision produced".to_string(),
		degraded: false,
	}
}

pub(crate) fn inputs_summary(record: &DecisionRecord) -> String {
	format!(
		"{} assessment for {}",
		record.context.payload_kind.as_str(),
		record.context.patient_ref,
	)
}

fn outputs_summary(record: &DecisionRecord) -> String {
	match (&record.score, record.confidence) {
		(Some(score), Some(confidence)) => format!(
			"score {:.1}, confidence {:.2}, state {}",
			score.raw_score,
			confidence,
			record.state.as_str(),
		),
		(Some(score), None) => {
			format!("score {:.1}, state {}", score.raw_score, record.state.as_str())
		},
		_ => format!("state {}", record.state.as_str()),
	}
}

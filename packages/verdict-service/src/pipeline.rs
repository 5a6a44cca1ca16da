use std::time::Duration;

use time::OffsetDateTime;
use tokio::time::Instant;
use uuid::Uuid;

use verdict_domain::{
	confidence,
	explain::{self, ExplainArgs},
	gate::{self, GateRouting},
	record::{DecisionRecord, DecisionState, PayloadKind, RequestContext},
	scoring::{self, ScoreResult},
};

use crate::{Error, ServiceResult, VerdictService, audit, cache::CachedAssessment, score::ScoringInput};

pub(crate) const SYSTEM_ACTOR: &str = "orchestrator";

impl VerdictService {
	/// Shared orchestration for both assessment operations: scoring and
	/// retrieval run concurrently, join, compose, gate, persist. The outer
	/// SLA governs the whole request; exceeding it cancels in-flight work
	/// and produces no record.
	pub(crate) async fn run_assessment(
		&self,
		ctx: RequestContext,
		input: ScoringInput,
		cache_key: Option<String>,
	) -> ServiceResult<DecisionRecord> {
		let decision_id = Uuid::new_v4();
		let budget_ms = self.budget_ms_for(&ctx);
		let budget = Duration::from_millis(budget_ms);
		let started = Instant::now();
		let inner = self.assessment_inner(decision_id, &ctx, &input, cache_key.as_deref());

		match tokio::time::timeout(budget, inner).await {
			Ok(result) => result,
			Err(_) => {
				let elapsed_ms = started.elapsed().as_millis() as u64;
				let now = OffsetDateTime::now_utc();
				let summary = format!(
					"{} assessment for {}",
					ctx.payload_kind.as_str(),
					ctx.patient_ref,
				);

				self.audit.emit(audit::failure_event(decision_id, summary, SYSTEM_ACTOR, now));

				tracing::error!(
					decision_id = %decision_id,
					elapsed_ms,
					budget_ms,
					"Assessment deadline exceeded; in-flight work cancelled."
				);

				Err(Error::Timeout { elapsed_ms, budget_ms })
			},
		}
	}

	fn budget_ms_for(&self, ctx: &RequestContext) -> u64 {
		let kind_budget = match ctx.payload_kind {
			PayloadKind::Screening | PayloadKind::CareProfile => self.cfg.budgets.screening_ms,
			PayloadKind::ClinicalNote => self.cfg.budgets.clinical_note_ms,
		};

		match ctx.deadline_ms {
			Some(deadline) if deadline > 0 => kind_budget.min(deadline),
			_ => kind_budget,
		}
	}

	async fn assessment_inner(
		&self,
		decision_id: Uuid,
		ctx: &RequestContext,
		input: &ScoringInput,
		cache_key: Option<&str>,
	) -> ServiceResult<DecisionRecord> {
		let now = OffsetDateTime::now_utc();

		if let Some(key) = cache_key
			&& let Some(cached) = self.cache.get(key)
		{
			tracing::debug!(decision_id = %decision_id, "Assessment served from the result cache.");

			return self.finish_assessment(decision_id, ctx, cached, false, now);
		}

		let query = input.retrieval_query(&self.cfg);
		let (score_outcome, retrieval) = tokio::join!(
			self.run_scoring(input),
			self.run_retrieval(
				&query,
				self.cfg.retrieval.min_relevance,
				self.cfg.retrieval.top_k,
				now,
			),
		);
		let (score, scoring_degraded) = self.resolve_scoring(score_outcome)?;

		if !scoring_degraded && score.data_completeness < self.cfg.scoring.completeness_floor {
			tracing::warn!(
				decision_id = %decision_id,
				completeness = score.data_completeness,
				floor = self.cfg.scoring.completeness_floor,
				"Assessment aborted: insufficient data."
			);

			return Err(Error::InsufficientData {
				completeness: score.data_completeness,
				floor: self.cfg.scoring.completeness_floor,
			});
		}

		let breakdown = confidence::compose(&self.cfg, &score, &retrieval);
		let explanation = explain::build_statements(ExplainArgs {
			cfg: &self.cfg,
			score: &score,
			retrieval: &retrieval,
			breakdown: &breakdown,
		});
		let disclaimers = explain::build_disclaimers(&self.cfg);
		let assessment = CachedAssessment {
			score,
			retrieval,
			confidence: breakdown.confidence,
			factors: breakdown.factors,
			explanation,
			disclaimers,
		};

		if let Some(key) = cache_key
			&& !scoring_degraded && !assessment.retrieval.degraded
		{
			self.cache.put(key.to_string(), assessment.clone());
		}

		self.finish_assessment(decision_id, ctx, assessment, scoring_degraded, now)
	}

	/// Walks the record through `Scored`, `Explained`, and the gate's
	/// routing, emitting one audit event per transition, then persists it.
	fn finish_assessment(
		&self,
		decision_id: Uuid,
		ctx: &RequestContext,
		assessment: CachedAssessment,
		scoring_degraded: bool,
		now: OffsetDateTime,
	) -> ServiceResult<DecisionRecord> {
		let CachedAssessment { score, retrieval, confidence, factors, explanation, disclaimers } =
			assessment;
		let raw_score = score.raw_score;
		let mut record = DecisionRecord::new(ctx.clone(), now);

		record.id = decision_id;
		record.degraded = scoring_degraded;
		record.score = Some(score);

		record.transition(DecisionState::Scored)?;
		self.emit_transition(&record, now);

		record.retrieval = Some(retrieval);
		record.confidence = Some(confidence);
		record.factors = factors;
		record.explanation = explanation;
		record.disclaimers = disclaimers;

		record.transition(DecisionState::Explained)?;
		self.emit_transition(&record, now);

		match gate::route(&self.cfg, confidence, raw_score, scoring_degraded) {
			GateRouting::AutoAcceptable => {
				record.transition(DecisionState::AutoAcceptable)?;
			},
			GateRouting::NeedsReview { reasons } => {
				tracing::info!(
					decision_id = %record.id,
					?reasons,
					"Decision routed to human review."
				);

				record.transition(DecisionState::NeedsReview)?;
			},
		}

		self.emit_transition(&record, now);
		self.decisions.insert(record.clone())?;

		Ok(record)
	}

	/// Fatal scoring faults engage the rule-based fallback; everything else
	/// propagates.
	fn resolve_scoring(
		&self,
		outcome: ServiceResult<ScoreResult>,
	) -> ServiceResult<(ScoreResult, bool)> {
		match outcome {
			Ok(score) => Ok((score, false)),
			Err(Error::Provider { message }) | Err(Error::Internal { message }) => {
				tracing::error!(
					error = %message,
					"Scoring engine failed; rule-based fallback engaged."
				);

				Ok((scoring::score_fallback(&self.cfg), true))
			},
			Err(err) => Err(err),
		}
	}

	pub(crate) fn emit_transition(&self, record: &DecisionRecord, now: OffsetDateTime) {
		self.audit.emit(audit::transition_event(record, SYSTEM_ACTOR, now));
	}
}

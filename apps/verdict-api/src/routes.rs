use axum::{
	Json, Router,
	extract::{Path, Query, State},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use verdict_domain::record::ReviewVerdict;
use verdict_service::{
	ClinicalInputRequest, ClinicalInputResponse, DecisionFetchResponse, DecisionListRequest,
	DecisionListResponse, Error as ServiceError, GuidelineFetchResponse, GuidelineQuery,
	GuidelineResponse, ReviewRequest, ReviewResponse, RiskAssessmentRequest,
	RiskAssessmentResponse,
};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/assessments/screening", post(assess_screening))
		.route("/v1/assessments/clinical-note", post(analyze_clinical_note))
		.route("/v1/guidelines/search", post(search_guidelines))
		.route("/v1/guidelines/{id}", get(get_guideline))
		.route("/v1/decisions", get(list_decisions))
		.route("/v1/decisions/{id}", get(get_decision))
		.route("/v1/decisions/{id}/review", post(submit_review))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn assess_screening(
	State(state): State<AppState>,
	Json(payload): Json<RiskAssessmentRequest>,
) -> Result<Json<RiskAssessmentResponse>, ApiError> {
	let response = state.service.compute_risk_assessment(payload).await?;
	Ok(Json(response))
}

async fn analyze_clinical_note(
	State(state): State<AppState>,
	Json(payload): Json<ClinicalInputRequest>,
) -> Result<Json<ClinicalInputResponse>, ApiError> {
	let response = state.service.analyze_clinical_input(payload).await?;
	Ok(Json(response))
}

async fn search_guidelines(
	State(state): State<AppState>,
	Json(payload): Json<GuidelineQuery>,
) -> Result<Json<GuidelineResponse>, ApiError> {
	let response = state.service.retrieve_guidelines(payload).await?;
	Ok(Json(response))
}

async fn get_guideline(
	State(state): State<AppState>,
	Path(id): Path<Uuid>,
) -> Result<Json<GuidelineFetchResponse>, ApiError> {
	let response = state.service.get_guideline(id).await?;
	Ok(Json(response))
}

async fn list_decisions(
	State(state): State<AppState>,
	Query(payload): Query<DecisionListRequest>,
) -> Result<Json<DecisionListResponse>, ApiError> {
	let response = state.service.list_decisions(payload).await?;
	Ok(Json(response))
}

async fn get_decision(
	State(state): State<AppState>,
	Path(id): Path<Uuid>,
) -> Result<Json<DecisionFetchResponse>, ApiError> {
	let response = state.service.get_decision(id).await?;
	Ok(Json(response))
}

#[derive(Debug, Deserialize)]
struct ReviewBody {
	reviewer_id: String,
	verdict: ReviewVerdict,
}

async fn submit_review(
	State(state): State<AppState>,
	Path(id): Path<Uuid>,
	Json(payload): Json<ReviewBody>,
) -> Result<Json<ReviewResponse>, ApiError> {
	let response = state
		.service
		.submit_review_verdict(ReviewRequest {
			decision_id: id,
			reviewer_id: payload.reviewer_id,
			verdict: payload.verdict,
		})
		.await?;
	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: &'static str,
	message: String,
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		let (status, error_code) = match &err {
			ServiceError::InsufficientData { .. } => {
				(StatusCode::UNPROCESSABLE_ENTITY, "insufficient_data")
			},
			ServiceError::Timeout { .. } => (StatusCode::GATEWAY_TIMEOUT, "timeout"),
			ServiceError::ReviewProtocol { .. } => (StatusCode::CONFLICT, "review_protocol"),
			ServiceError::InvalidRequest { .. } => {
				(StatusCode::UNPROCESSABLE_ENTITY, "invalid_request")
			},
			ServiceError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
			ServiceError::Provider { .. } => (StatusCode::BAD_GATEWAY, "provider_error"),
			ServiceError::Store { .. } => (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable"),
			ServiceError::Internal { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
		};

		Self { status, error_code, message: err.to_string() }
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code.to_string(), message: self.message };

		(self.status, Json(body)).into_response()
	}
}

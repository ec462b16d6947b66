//! REST API over the job orchestrator.

use crate::demo::DemoData;
use axum::{
	extract::{
		rejection::{JsonRejection, QueryRejection},
		Path, Query, State,
	},
	http::StatusCode,
	response::{IntoResponse, Json, Response},
	routing::{get, put},
	Router,
};
use schedule_core::{JobOrchestrator, JobStatusSummary, OrchestratorError};
use schedule_solver::{FetchPolicy, ScoreAnalysis};
use schedule_types::{JobId, LeaderSchedule};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, instrument, warn};

#[derive(Clone)]
pub struct AppState {
	pub orchestrator: Arc<JobOrchestrator>,
	pub demo: Arc<DemoData>,
}

/// Error body of every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub job_id: Option<String>,
	pub message: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
	#[error(transparent)]
	Orchestrator(#[from] OrchestratorError),

	#[error("No schedule found for job {0}")]
	MalformedJobId(String),

	#[error("Invalid request body: {}", .0.body_text())]
	Body(#[from] JsonRejection),

	#[error("Invalid query: {}", .0.body_text())]
	Query(#[from] QueryRejection),
}

/// Query parameters of `PUT /schedules/analyze`.
#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeQuery {
	/// Defaults to [`FetchPolicy::FetchAll`].
	#[serde(default, alias = "fetchPolicy")]
	pub fetch_policy: Option<FetchPolicy>,
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let message = self.to_string();
		let (status, job_id) = match &self {
			ApiError::Orchestrator(error) => {
				let status = match error {
					OrchestratorError::NotFound(_) => StatusCode::NOT_FOUND,
					OrchestratorError::SolverFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
					OrchestratorError::InvalidProblem(_) => StatusCode::BAD_REQUEST,
				};
				(status, error.job_id().map(|id| id.to_string()))
			}
			ApiError::MalformedJobId(raw) => (StatusCode::NOT_FOUND, Some(raw.clone())),
			ApiError::Body(rejection) => (rejection.status(), None),
			ApiError::Query(rejection) => (rejection.status(), None),
		};

		(status, Json(ErrorInfo { job_id, message })).into_response()
	}
}

fn parse_job_id(raw: &str) -> Result<JobId, ApiError> {
	raw.parse()
		.map_err(|_| ApiError::MalformedJobId(raw.to_string()))
}

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health_check))
		.route("/demo-data", get(demo_data))
		.route("/schedules", get(list_jobs).post(submit))
		.route("/schedules/analyze", put(analyze))
		.route("/schedules/{job_id}", get(get_schedule).delete(terminate))
		.route("/schedules/{job_id}/status", get(get_status))
		.with_state(state)
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(CorsLayer::permissive()),
		)
}

/// Serves the API on `address` until `shutdown` completes.
pub async fn start_http_server<F>(state: AppState, address: &str, shutdown: F) -> anyhow::Result<()>
where
	F: Future<Output = ()> + Send + 'static,
{
	let listener = tokio::net::TcpListener::bind(address).await?;
	info!("API server listening on {}", address);

	axum::serve(listener, router(state))
		.with_graceful_shutdown(shutdown)
		.await?;

	Ok(())
}

async fn health_check() -> StatusCode {
	StatusCode::OK
}

#[instrument(skip(state))]
async fn demo_data(State(state): State<AppState>) -> Json<LeaderSchedule> {
	Json(state.demo.generate().await)
}

async fn list_jobs(State(state): State<AppState>) -> Json<Vec<JobId>> {
	Json(state.orchestrator.list())
}

#[instrument(skip_all)]
async fn submit(
	State(state): State<AppState>,
	payload: Result<Json<LeaderSchedule>, JsonRejection>,
) -> Result<(StatusCode, String), ApiError> {
	let Json(problem) = payload?;
	let job_id = state.orchestrator.submit(problem).map_err(|e| {
		warn!(error = %e, "Rejected schedule");
		e
	})?;
	Ok((StatusCode::ACCEPTED, job_id.to_string()))
}

#[instrument(skip_all)]
async fn analyze(
	State(state): State<AppState>,
	query: Result<Query<AnalyzeQuery>, QueryRejection>,
	payload: Result<Json<LeaderSchedule>, JsonRejection>,
) -> Result<Json<ScoreAnalysis>, ApiError> {
	let Query(query) = query?;
	let Json(problem) = payload?;
	let policy = query.fetch_policy.unwrap_or_default();
	Ok(Json(state.orchestrator.analyze(&problem, policy)?))
}

#[instrument(skip(state))]
async fn get_schedule(
	State(state): State<AppState>,
	Path(job_id): Path<String>,
) -> Result<Json<LeaderSchedule>, ApiError> {
	let job_id = parse_job_id(&job_id)?;
	Ok(Json(state.orchestrator.get_latest(&job_id)?.schedule))
}

#[instrument(skip(state))]
async fn get_status(
	State(state): State<AppState>,
	Path(job_id): Path<String>,
) -> Result<Json<JobStatusSummary>, ApiError> {
	let job_id = parse_job_id(&job_id)?;
	Ok(Json(state.orchestrator.get_status(&job_id)?))
}

#[instrument(skip(state))]
async fn terminate(
	State(state): State<AppState>,
	Path(job_id): Path<String>,
) -> Result<Json<LeaderSchedule>, ApiError> {
	let job_id = parse_job_id(&job_id)?;
	Ok(Json(state.orchestrator.terminate(&job_id)?.schedule))
}

//! HTTP request handlers for the extraction service.
//!
//! Implements job submission, synchronous extraction, job status and health
//! endpoints using axum.

use axum::{
    extract::{
        multipart::MultipartError, rejection::JsonRejection, DefaultBodyLimit, Multipart, Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router as AxumRouter,
};
use chrono::{DateTime, Utc};
use ruleforge_domain::{DocumentRef, Finding, Job, JobId};
use ruleforge_jobs::{JobError, JobMetrics, JobOrchestrator};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, warn};

/// Slack for multipart framing on top of the document size limit
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Runs synchronous and background extractions
    pub orchestrator: Arc<JobOrchestrator>,
}

impl AppState {
    /// Create state around a running orchestrator
    pub fn new(orchestrator: Arc<JobOrchestrator>) -> Self {
        Self { orchestrator }
    }

    fn upload_body_limit(&self) -> usize {
        let limit = self.orchestrator.config().max_document_bytes();
        usize::try_from(limit)
            .unwrap_or(usize::MAX)
            .saturating_add(MULTIPART_OVERHEAD_BYTES)
    }
}

/// Job submission request
#[derive(Debug, Deserialize)]
pub struct SubmitJobRequest {
    /// URL of the document to extract
    pub file_url: Option<String>,
    /// URL receiving lifecycle events
    pub webhook_url: Option<String>,
}

/// Job submission response
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitJobResponse {
    /// Id of the accepted job
    pub job_id: JobId,
    /// Always `accepted`
    pub status: String,
}

/// Synchronous extraction request
#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    /// URL of the document to extract
    pub file_url: Option<String>,
}

/// Snapshot of a job
#[derive(Debug, Serialize, Deserialize)]
pub struct JobStatusResponse {
    /// Job id
    pub job_id: JobId,
    /// Current state (`created`, `processing`, `succeeded`, `failed`)
    pub status: String,
    /// Document reference as submitted
    pub document: String,
    /// Failure description for failed jobs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Number of findings for succeeded jobs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules_count: Option<usize>,
    /// Findings for succeeded jobs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<Finding>>,
    /// When the job was accepted
    pub created_at: DateTime<Utc>,
    /// Last state change
    pub updated_at: DateTime<Utc>,
}

impl From<Job> for JobStatusResponse {
    fn from(job: Job) -> Self {
        let rules = job.findings().map(<[Finding]>::to_vec);
        Self {
            job_id: job.job_id,
            status: job.state().to_string(),
            document: job.document.to_string(),
            error: job.error().map(str::to_string),
            rules_count: rules.as_ref().map(Vec::len),
            rules,
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    /// Overall health status
    pub status: String,
    /// Job counters
    pub jobs: JobMetrics,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable error code
    pub error: String,
    /// Human-readable description
    pub message: String,
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// Error from the job layer
    Job(JobError),
    /// Malformed request body or parameters
    BadRequest(String),
    /// No job with this id is known
    JobNotFound(String),
}

impl From<JobError> for AppError {
    fn from(e: JobError) -> Self {
        AppError::Job(e)
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        AppError::BadRequest(format!("Invalid JSON body: {}", e.body_text()))
    }
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::JobNotFound(_) => (StatusCode::NOT_FOUND, "job_not_found"),
            AppError::Job(e) => match e {
                JobError::Validation(_) => (StatusCode::BAD_REQUEST, "bad_request"),
                JobError::UnsupportedType(_) => (StatusCode::BAD_REQUEST, "unsupported_file_type"),
                JobError::ResourceLimit { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "file_too_large"),
                JobError::NotFound(_) => (StatusCode::NOT_FOUND, "document_not_found"),
                JobError::Document(_) => (StatusCode::UNPROCESSABLE_ENTITY, "unreadable_document"),
                JobError::Transport(_) => (StatusCode::BAD_GATEWAY, "fetch_failed"),
                JobError::Extraction(_) => (StatusCode::INTERNAL_SERVER_ERROR, "extraction_failed"),
                JobError::QueueFull => (StatusCode::SERVICE_UNAVAILABLE, "queue_full"),
                JobError::ShuttingDown => (StatusCode::SERVICE_UNAVAILABLE, "shutting_down"),
                JobError::Io(_) | JobError::Config(_) | JobError::Worker(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
                }
            },
        }
    }

    fn message(self) -> String {
        match self {
            AppError::Job(e) => e.to_string(),
            AppError::BadRequest(msg) => msg,
            AppError::JobNotFound(id) => format!("Job not found: {}", id),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = self.message();

        if status.is_server_error() {
            error!(status = %status, code, "Request failed: {}", message);
        } else {
            warn!(status = %status, code, "Request rejected: {}", message);
        }

        let body = Json(ErrorResponse {
            error: code.to_string(),
            message,
        });
        (status, body).into_response()
    }
}

/// POST /v1/jobs - Accept a background extraction job
async fn submit_job(
    State(state): State<AppState>,
    payload: Result<Json<SubmitJobRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmitJobResponse>), AppError> {
    let Json(request) = payload?;
    let (Some(file_url), Some(webhook_url)) = (non_blank(request.file_url), non_blank(request.webhook_url)) else {
        return Err(AppError::BadRequest("Missing file_url or webhook_url".to_string()));
    };

    let job_id = state
        .orchestrator
        .submit(DocumentRef::Url(file_url), Some(webhook_url))?;

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitJobResponse {
            job_id,
            status: "accepted".to_string(),
        }),
    ))
}

/// GET /v1/jobs/:job_id - Current job snapshot
async fn job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobStatusResponse>, AppError> {
    let id = JobId::from_string(&job_id).map_err(AppError::BadRequest)?;
    let job = state
        .orchestrator
        .status(&id)
        .ok_or(AppError::JobNotFound(job_id))?;
    Ok(Json(job.into()))
}

/// POST /v1/extract - Extract a remote document and return its findings
async fn extract(
    State(state): State<AppState>,
    payload: Result<Json<ExtractRequest>, JsonRejection>,
) -> Result<Json<Vec<Finding>>, AppError> {
    let Json(request) = payload?;
    let file_url = non_blank(request.file_url)
        .ok_or_else(|| AppError::BadRequest("Missing file_url".to_string()))?;

    let findings = state
        .orchestrator
        .extract_now(&DocumentRef::Url(file_url))
        .await?;
    Ok(Json(findings))
}

/// POST /v1/extract/upload - Extract an uploaded document
///
/// Expects a multipart form with a `file` field.
async fn extract_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Vec<Finding>>, AppError> {
    let limit_mb = state.orchestrator.config().max_document_mb;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit_mb))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::BadRequest("Uploaded file has no name".to_string()))?;
        let bytes = field.bytes().await.map_err(|e| multipart_error(e, limit_mb))?;

        let findings = state
            .orchestrator
            .extract_upload(&file_name, bytes.to_vec())
            .await?;
        return Ok(Json(findings));
    }

    Err(AppError::BadRequest("Missing 'file' field".to_string()))
}

fn multipart_error(e: MultipartError, limit_mb: u64) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::Job(JobError::ResourceLimit { size: 0, limit_mb })
    } else {
        AppError::BadRequest(e.body_text())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// GET /health - Service health and job counters
async fn health_check(State(state): State<AppState>) -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "healthy".to_string(),
        jobs: state.orchestrator.metrics(),
    })
}

/// GET / - Service description
async fn index() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Rule Extractor API",
        "endpoints": {
            "health": "GET /health",
            "submit_job": "POST /v1/jobs",
            "job_status": "GET /v1/jobs/{job_id}",
            "extract": "POST /v1/extract",
            "extract_upload": "POST /v1/extract/upload",
        }
    }))
}

/// Create the axum router with all routes
pub fn create_router(state: AppState) -> AxumRouter {
    let upload_limit = state.upload_body_limit();

    AxumRouter::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/v1/health", get(health_check))
        .route("/v1/jobs", post(submit_job))
        .route("/v1/jobs/:job_id", get(job_status))
        .route("/v1/extract", post(extract))
        .route(
            "/v1/extract/upload",
            post(extract_upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .with_state(state)
}

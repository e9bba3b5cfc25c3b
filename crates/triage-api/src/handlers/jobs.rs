use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;
use tracing::info;
use triage_core::{Format, LogSource};
use triage_llm::{ProgressState, ProgressTracker};
use uuid::Uuid;

use crate::models::{ApiError, CreateJobRequest, CreateJobResponse, JobResponse};
use crate::state::{AppState, Job};

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

/// Accepts a log and runs its analysis in the background
pub async fn create_job(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<CreateJobResponse>), (StatusCode, Json<ApiError>)> {
    if req.filename.trim().is_empty() {
        return Err(ApiError::bad_request("filename is required"));
    }

    let mut source = LogSource::from_bytes(req.filename, req.content.as_bytes());
    if let Some(hint) = req.format.as_deref() {
        source.format = Format::from_hint(hint)
            .ok_or_else(|| ApiError::bad_request(format!("Unknown format '{}'", hint)))?;
    }

    let id = Uuid::new_v4();
    let tracker = ProgressTracker::new();
    state.insert_job(id, Job::new(&source, tracker.clone()));

    info!(
        job_id = %id,
        filename = %source.name,
        format = ?source.format,
        bytes = source.content.len(),
        "Analysis job accepted"
    );

    let response = CreateJobResponse {
        job_id: id.to_string(),
        filename: source.name.clone(),
        format: source.format,
        status: "accepted".to_string(),
    };

    let worker = state.clone();
    tokio::spawn(async move {
        let outcome = worker.analyze_source(&source, &tracker).await;
        worker.finish_job(id, outcome);
        info!(job_id = %id, "Analysis job finished");
    });

    Ok((StatusCode::ACCEPTED, Json(response)))
}

pub async fn get_job_progress(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<ProgressState> {
    let job = lookup(&state, &id)?;
    Ok(Json(job.tracker.snapshot()))
}

pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<JobResponse> {
    let job = lookup(&state, &id)?;
    Ok(Json(JobResponse::from_job(id, job)))
}

fn lookup(state: &AppState, id: &str) -> Result<Job, (StatusCode, Json<ApiError>)> {
    Uuid::parse_str(id)
        .ok()
        .and_then(|uuid| state.job(&uuid))
        .ok_or_else(|| ApiError::not_found(format!("No analysis job with id {}", id)))
}

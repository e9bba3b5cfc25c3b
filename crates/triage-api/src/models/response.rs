use axum::{Json, http::StatusCode};
use serde::Serialize;
use triage_core::{Format, ParsedAnalysis};
use triage_llm::ProgressState;

use crate::state::{Job, JobOutcome};

/// JSON error response
#[derive(Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: u16,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<Self>) {
        (
            status,
            Json(Self {
                error: message.into(),
                code: status.as_u16(),
            }),
        )
    }

    pub fn bad_request(message: impl Into<String>) -> (StatusCode, Json<Self>) {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> (StatusCode, Json<Self>) {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn not_found(message: impl Into<String>) -> (StatusCode, Json<Self>) {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

#[derive(Serialize)]
pub struct CreateJobResponse {
    pub job_id: String,
    pub filename: String,
    pub format: Format,
    pub status: String,
}

#[derive(Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Completed,
    Failed,
}

#[derive(Serialize)]
pub struct JobResponse {
    pub job_id: String,
    pub filename: String,
    pub format: Format,
    pub created_at: String,
    pub status: JobStatus,
    pub progress: ProgressState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<ParsedAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobResponse {
    pub fn from_job(job_id: String, job: Job) -> Self {
        let (status, analysis, error) = match job.outcome {
            None => (JobStatus::Running, None, None),
            Some(JobOutcome::Completed(analysis)) => (JobStatus::Completed, Some(analysis), None),
            Some(JobOutcome::Failed(error)) => (JobStatus::Failed, None, Some(error)),
        };
        Self {
            job_id,
            filename: job.filename,
            format: job.format,
            created_at: job.created_at,
            status,
            progress: job.tracker.snapshot(),
            analysis,
            error,
        }
    }
}

#[derive(Serialize)]
pub struct DemoResponse {
    pub filename: String,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<ParsedAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

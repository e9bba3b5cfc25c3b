use axum::{Json, extract::State};
use std::sync::Arc;
use tracing::info;
use triage_core::{Format, LogSource};
use triage_llm::ProgressTracker;

use crate::models::{DemoResponse, JobStatus};
use crate::state::{AppState, JobOutcome, SAMPLE_INCIDENT};

/// Analyze the bundled sample incident and wait for the answer
pub async fn run_demo(State(state): State<Arc<AppState>>) -> Json<DemoResponse> {
    info!("Demo analysis request");

    let source = LogSource::with_format("sample_incident.log", SAMPLE_INCIDENT, Format::Text);
    let outcome = state.analyze_source(&source, &ProgressTracker::new()).await;

    let (status, analysis, error) = match outcome {
        JobOutcome::Completed(analysis) => (JobStatus::Completed, Some(analysis), None),
        JobOutcome::Failed(error) => (JobStatus::Failed, None, Some(error)),
    };

    Json(DemoResponse {
        filename: source.name,
        status,
        analysis,
        error,
    })
}

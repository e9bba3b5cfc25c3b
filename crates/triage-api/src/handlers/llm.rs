use axum::{Json, extract::State};
use std::sync::Arc;
use tracing::info;
use triage_llm::ConnectionReport;

use crate::state::AppState;

pub async fn llm_status(State(state): State<Arc<AppState>>) -> Json<ConnectionReport> {
    info!(model = %state.engine.model(), "LLM status request");
    Json(state.engine.validate_connection().await)
}

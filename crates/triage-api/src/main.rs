mod handlers;
mod middleware;
mod models;
mod routes;
mod state;

use std::sync::Arc;
use tracing::info;
use triage_core::{ParserRegistry, TriageConfig, load_config};
use triage_llm::AnalysisEngine;

use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    dotenvy::dotenv().ok();

    //logging setup
    tracing_subscriber::fmt::init();

    let config = match std::env::var("TRIAGE_CONFIG").ok().filter(|p| !p.is_empty()) {
        Some(path) => {
            info!(path = %path, "Loading config file");
            load_config(&path)?
        }
        None => TriageConfig::from_env(),
    };

    info!("Setting up analysis engine...");
    let engine = AnalysisEngine::from_config(&config)?;
    info!(
        model = %engine.model(),
        base_url = %config.llm.base_url,
        "Analysis engine ready!"
    );

    let parser_registry = ParserRegistry::from_config(&config);
    info!("Parsers registered: json, csv, text");

    let state = Arc::new(AppState::new(engine, parser_registry));
    let app = routes::router(state);

    // Log if API key is enabled
    if middleware::configured_key().is_some() {
        info!("API key authentication ENABLED");
    } else {
        info!("API key authentication DISABLED (set {} to enable)", middleware::API_KEY_VAR);
    }

    let addr = std::env::var("TRIAGE_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

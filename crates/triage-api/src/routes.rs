use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::handlers::{create_job, get_job, get_job_progress, llm_status, run_demo};
use crate::middleware::require_api_key;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    // routes behind the optional API key
    let protected_routes = Router::new()
        .route("/api/jobs", post(create_job))
        .route("/api/jobs/{id}", get(get_job))
        .route("/api/jobs/{id}/progress", get(get_job_progress))
        .route("/api/demo", post(run_demo))
        .route("/api/llm/status", get(llm_status))
        .layer(middleware::from_fn(require_api_key));

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use std::time::Duration;
    use tower::ServiceExt;
    use triage_core::{ParserRegistry, TriageConfig};
    use triage_llm::{AnalysisEngine, ChatRequest, LlmClient, LlmError};

    struct CannedClient;

    #[async_trait]
    impl LlmClient for CannedClient {
        async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError> {
            if request.messages.len() == 1 {
                return Ok("LLM validation successful".to_string());
            }
            Ok("<think>disk is full</think>\n\n## 🔍 Step-by-Step Analysis\n\n1. Disk full\n\n## 📋 TLDR\n\nFree disk space.".to_string())
        }

        fn model(&self) -> &str {
            "canned"
        }

        fn provider(&self) -> &str {
            "canned"
        }
    }

    fn state() -> AppState {
        let config = TriageConfig::default();
        let engine = AnalysisEngine::new(Box::new(CannedClient), &config).unwrap();
        AppState::new(engine, ParserRegistry::from_config(&config))
    }

    fn app() -> Router {
        router(Arc::new(state()))
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn submit(app: &Router, filename: &str, content: &str) -> String {
        let upload = json!({ "filename": filename, "content": content });
        let response = app.clone().oneshot(post_json("/api/jobs", upload)).await.unwrap();
        body_json(response).await["job_id"].as_str().unwrap().to_string()
    }

    // poll until the background task has finished
    async fn wait_for(app: &Router, id: &str) -> Value {
        let mut job = Value::Null;
        for _ in 0..50 {
            let response = app
                .clone()
                .oneshot(get_request(&format!("/api/jobs/{}", id)))
                .await
                .unwrap();
            job = body_json(response).await;
            if job["status"] != "running" {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        job
    }

    async fn status_of(app: &Router, id: &str) -> StatusCode {
        app.clone()
            .oneshot(get_request(&format!("/api/jobs/{}", id)))
            .await
            .unwrap()
            .status()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app().oneshot(get_request("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_job_lifecycle() {
        let app = app();
        let upload = json!({
            "filename": "incident.csv",
            "content": "timestamp,level,message\n2024-01-01,ERROR,disk full\n"
        });

        let response = app.clone().oneshot(post_json("/api/jobs", upload)).await.unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let created = body_json(response).await;
        assert_eq!(created["format"], "csv");
        let id = created["job_id"].as_str().unwrap().to_string();

        let job = wait_for(&app, &id).await;
        println!("Job: {}", job);
        assert_eq!(job["status"], "completed");
        assert_eq!(job["analysis"]["tldr"], "Free disk space.");
        assert_eq!(job["analysis"]["thinking"], "disk is full");

        let response = app
            .oneshot(get_request(&format!("/api/jobs/{}/progress", id)))
            .await
            .unwrap();
        let progress = body_json(response).await;
        assert_eq!(progress["percent"], 100);
        assert_eq!(progress["processing"], false);
        assert_eq!(progress["message"], "Analysis complete");
    }

    #[tokio::test]
    async fn test_rejected_upload_fails_job() {
        let app = app();
        let id = submit(&app, "tiny.log", "short").await;

        let job = wait_for(&app, &id).await;
        assert_eq!(job["status"], "failed");
        assert!(job["error"].as_str().unwrap().starts_with("Security validation failed:"));
    }

    #[tokio::test]
    async fn test_new_job_reports_processing() {
        let app = app();
        let id = submit(&app, "incident.log", "2024-01-01 ERROR disk full").await;

        let response = app
            .oneshot(get_request(&format!("/api/jobs/{}/progress", id)))
            .await
            .unwrap();
        let progress = body_json(response).await;
        let percent = progress["percent"].as_u64().unwrap();
        assert_eq!(progress["processing"], percent < 100);
    }

    #[tokio::test]
    async fn test_finished_jobs_are_capped() {
        let app = router(Arc::new(state().with_job_retention(Duration::from_secs(3600), 1)));
        let log = "2024-01-01 ERROR disk full";

        let first = submit(&app, "a.log", log).await;
        assert_eq!(wait_for(&app, &first).await["status"], "completed");
        let second = submit(&app, "b.log", log).await;
        assert_eq!(wait_for(&app, &second).await["status"], "completed");

        // inserting a third job drops the oldest finished one
        let third = submit(&app, "c.log", log).await;
        assert_eq!(status_of(&app, &first).await, StatusCode::NOT_FOUND);
        assert_eq!(status_of(&app, &second).await, StatusCode::OK);
        assert_eq!(status_of(&app, &third).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_expired_jobs_are_evicted() {
        let app = router(Arc::new(state().with_job_retention(Duration::ZERO, 100)));
        let log = "2024-01-01 ERROR disk full";

        let first = submit(&app, "a.log", log).await;
        wait_for(&app, &first).await;
        assert_eq!(status_of(&app, &first).await, StatusCode::OK);

        let second = submit(&app, "b.log", log).await;
        assert_eq!(status_of(&app, &first).await, StatusCode::NOT_FOUND);
        assert_eq!(status_of(&app, &second).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_job_is_404() {
        let app = app();
        let response = app
            .clone()
            .oneshot(get_request("/api/jobs/not-a-uuid/progress"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let missing = uuid::Uuid::new_v4();
        let response = app
            .oneshot(get_request(&format!("/api/jobs/{}", missing)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["code"], 404);
    }

    #[tokio::test]
    async fn test_unknown_format_hint() {
        let upload = json!({ "filename": "a.log", "content": "x", "format": "yaml" });
        let response = app().oneshot(post_json("/api/jobs", upload)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_demo_and_status() {
        let app = app();
        let response = app.clone().oneshot(post_json("/api/demo", json!({}))).await.unwrap();
        let demo = body_json(response).await;
        assert_eq!(demo["status"], "completed");
        assert_eq!(demo["filename"], "sample_incident.log");

        let response = app.oneshot(get_request("/api/llm/status")).await.unwrap();
        let status = body_json(response).await;
        assert_eq!(status["status"], "connected");
        assert_eq!(status["validation_passed"], true);
        assert_eq!(status["model"], "canned");
    }
}

//! REST API tests for the HTTP gateway.
//!
//! Uses tower's `ServiceExt::oneshot` against the router, so no port is bound.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use delve_core::brain::{Brain, MockLlmProvider};
use delve_core::error::LlmError;
use delve_core::gateway::{AppState, GatewayConfig, router};
use delve_core::research::{PipelineSteps, ResearchConfig, ResearchEngine};
use delve_core::search::PlaceholderSearchProvider;
use std::sync::Arc;
use tower::ServiceExt;

// --- Helpers ---

/// An engine whose model answers each step by recognizing its prompt.
fn scripted_engine() -> Arc<ResearchEngine> {
    let provider = MockLlmProvider::with_handler(|prompt| {
        Ok(if prompt.contains("TOPIC:") {
            r#"["history", "applications", "risks"]"#.to_string()
        } else if prompt.contains("ORIGINAL QUERY:") {
            "expanded query".to_string()
        } else if prompt.contains("critique specialist") {
            r#"{"critique": "Well sourced.", "needs_refinement": false}"#.to_string()
        } else {
            "A concise summary.".to_string()
        })
    });
    engine_with(provider)
}

fn engine_with(provider: MockLlmProvider) -> Arc<ResearchEngine> {
    let brain = Arc::new(Brain::new(Arc::new(provider)));
    let config = ResearchConfig::default();
    let steps = PipelineSteps::from_collaborators(
        brain,
        Arc::new(PlaceholderSearchProvider),
        &config.models,
    );
    Arc::new(ResearchEngine::new(steps, config))
}

fn app(engine: Arc<ResearchEngine>) -> axum::Router {
    router(AppState::new(engine), &GatewayConfig::default())
}

async fn post_research(app: axum::Router, body: &str) -> (StatusCode, serde_json::Value) {
    let req = Request::builder()
        .method("POST")
        .uri("/api/research")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let resp = ServiceExt::<Request<Body>>::oneshot(app, req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), 100_000)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

// --- Tests ---

#[tokio::test]
async fn test_health() {
    let req = Request::builder()
        .uri("/api/health")
        .body(Body::empty())
        .unwrap();
    let resp = ServiceExt::<Request<Body>>::oneshot(app(scripted_engine()), req)
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(resp.into_body(), 10_000)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["status"], "healthy");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_research_success() {
    let (status, json) = post_research(
        app(scripted_engine()),
        r#"{"topic": "nuclear fusion", "max_results": 2}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["summary"], "A concise summary.");
    assert_eq!(json["critique"], "Well sourced.");
    assert_eq!(
        json["subtopics"],
        serde_json::json!(["history", "applications", "risks"])
    );

    let results = json["search_results"].as_array().unwrap();
    assert_eq!(results.len(), 6);
    assert_eq!(results[0]["title"], "Result 1 for expanded query");
    assert_eq!(results[0]["url"], "https://example.com/result-1");
    assert!(results[0]["snippet"].is_string());
    // Only the four documented fields are returned
    assert_eq!(json.as_object().unwrap().len(), 4);
}

#[tokio::test]
async fn test_research_default_max_results() {
    let (status, json) =
        post_research(app(scripted_engine()), r#"{"topic": "nuclear fusion"}"#).await;
    assert_eq!(status, StatusCode::OK);
    // Default of 5 per query, capped at 3 by the placeholder provider
    assert_eq!(json["search_results"].as_array().unwrap().len(), 9);
}

#[tokio::test]
async fn test_research_blank_topic_is_422() {
    let (status, json) = post_research(app(scripted_engine()), r#"{"topic": "  "}"#).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["detail"].as_str().unwrap().contains("topic"));
}

#[tokio::test]
async fn test_research_zero_max_results_is_422() {
    let (status, json) = post_research(
        app(scripted_engine()),
        r#"{"topic": "fusion", "max_results": 0}"#,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["detail"].as_str().unwrap().contains("max_results"));
}

#[tokio::test]
async fn test_research_missing_topic_is_rejected() {
    let (status, json) = post_research(app(scripted_engine()), r#"{"max_results": 2}"#).await;
    assert!(status.is_client_error());
    assert!(json["detail"].is_string());
}

#[tokio::test]
async fn test_research_pipeline_failure_is_500() {
    let provider = MockLlmProvider::with_handler(|prompt| {
        if prompt.contains("ORIGINAL QUERY:") {
            Err(LlmError::Connection {
                message: "connection refused".into(),
            })
        } else {
            Ok(r#"["a", "b", "c"]"#.to_string())
        }
    });
    let (status, json) =
        post_research(app(engine_with(provider)), r#"{"topic": "fusion"}"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let detail = json["detail"].as_str().unwrap();
    assert!(detail.contains("expand"));
    assert!(detail.contains("connection refused"));
}

#[tokio::test]
async fn test_cors_headers_present() {
    let req = Request::builder()
        .uri("/api/health")
        .header("origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let resp = ServiceExt::<Request<Body>>::oneshot(app(scripted_engine()), req)
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(
        resp.headers()
            .contains_key("access-control-allow-origin")
    );
}

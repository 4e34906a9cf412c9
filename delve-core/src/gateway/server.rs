//! HTTP gateway server built on axum.

use super::GatewayConfig;
use super::types::{ApiError, HealthResponse, ResearchRequest, ResearchResponse};
use crate::error::DelveError;
use crate::research::ResearchEngine;
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ResearchEngine>,
    pub version: String,
}

impl AppState {
    pub fn new(engine: Arc<ResearchEngine>) -> Self {
        Self {
            engine,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Build an axum Router with `/api/research` and `/api/health` routes.
pub fn router(state: AppState, config: &GatewayConfig) -> Router {
    let app = Router::new()
        .route("/api/research", post(research_handler))
        .route("/api/health", get(health_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if config.cors_permissive {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

/// Run the pipeline for the posted topic.
async fn research_handler(
    State(state): State<AppState>,
    payload: Result<Json<ResearchRequest>, JsonRejection>,
) -> Result<Json<ResearchResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        ApiError::new(rejection.status(), rejection.body_text())
    })?;
    let max_results = request
        .max_results
        .unwrap_or(state.engine.config().default_max_results as i64);

    info!(topic = %request.topic, max_results, "Research request received");
    let report = state.engine.run(&request.topic, max_results).await?;
    Ok(Json(report.into()))
}

/// Health check endpoint.
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
    })
}

/// Start the gateway on the configured address.
///
/// Runs until Ctrl-C.
pub async fn run(config: &GatewayConfig, engine: Arc<ResearchEngine>) -> Result<(), DelveError> {
    let app = router(AppState::new(engine), config);
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Gateway listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

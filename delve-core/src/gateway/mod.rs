//! HTTP gateway: exposes a research run as a JSON endpoint.
//!
//! Routes:
//! - `POST /api/research` with `{topic, max_results?}`
//! - `GET /api/health`

pub mod server;
pub mod types;

use serde::{Deserialize, Serialize};

pub use server::{AppState, router, run};
pub use types::{ApiError, HealthResponse, ResearchRequest, ResearchResponse};

/// Configuration for the HTTP gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Allow requests from any origin.
    pub cors_permissive: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_permissive: true,
        }
    }
}

impl GatewayConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

//! Search collaborator.
//!
//! Defines the `SearchProvider` trait and its implementations:
//! - `placeholder`: deterministic synthetic records, no network
//! - `duckduckgo`: DuckDuckGo Instant Answer API, no key
//! - `serpapi`: Google results through SerpAPI, key required
//!
//! Use `create_search_provider()` to pick one from configuration.

pub mod duckduckgo;
pub mod placeholder;
pub mod serpapi;

use crate::error::SearchError;
use crate::types::SearchResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use duckduckgo::DuckDuckGoProvider;
pub use placeholder::PlaceholderSearchProvider;
pub use serpapi::SerpApiProvider;

/// A web-search backend.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Return up to `max_results` records for `query`, in provider order.
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, SearchError>;

    /// Short provider name for logs.
    fn name(&self) -> &str;
}

/// Search provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Provider name: "placeholder", "duckduckgo", "serpapi".
    pub provider: String,
    /// Environment variable name containing the API key (serpapi only).
    pub api_key_env: String,
    /// API key set directly in configuration. Never written back out.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// Optional base URL override for the provider endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            provider: "placeholder".to_string(),
            api_key_env: "SERPAPI_API_KEY".to_string(),
            api_key: None,
            base_url: None,
            timeout_secs: 10,
        }
    }
}

/// Create a search provider based on the configuration.
pub fn create_search_provider(
    config: &SearchConfig,
) -> Result<Arc<dyn SearchProvider>, SearchError> {
    match config.provider.as_str() {
        "placeholder" | "mock" => Ok(Arc::new(PlaceholderSearchProvider)),
        "duckduckgo" | "ddg" => Ok(Arc::new(DuckDuckGoProvider::new(config)?)),
        "serpapi" => Ok(Arc::new(SerpApiProvider::new(config)?)),
        other => Err(SearchError::UnsupportedProvider {
            provider: other.to_string(),
        }),
    }
}

pub(crate) fn build_client(timeout_secs: u64) -> Result<reqwest::Client, SearchError> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .user_agent(concat!("Delve/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| SearchError::Request {
            message: format!("Failed to create HTTP client: {}", e),
        })
}

//! SerpAPI (Google results) search provider.

use super::{SearchConfig, SearchProvider, build_client};
use crate::error::SearchError;
use crate::types::SearchResult;
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://serpapi.com/search.json";

pub struct SerpApiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SerpApiProvider {
    /// Create a provider, resolving the key from `config.api_key` or the
    /// environment variable named by `config.api_key_env`.
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var(&config.api_key_env).ok())
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| SearchError::AuthFailed {
                provider: format!("SerpAPI (env var '{}' not set)", config.api_key_env),
            })?;

        Ok(Self {
            client: build_client(config.timeout_secs)?,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
        })
    }

    fn request_url(&self, query: &str, max_results: usize) -> String {
        format!(
            "{}?engine=google&q={}&num={}&api_key={}",
            self.base_url,
            urlencoding::encode(query),
            max_results,
            urlencoding::encode(&self.api_key)
        )
    }

    fn parse_results(body: &Value, max_results: usize) -> Result<Vec<SearchResult>, SearchError> {
        if let Some(error) = body.get("error").and_then(|v| v.as_str()) {
            return Err(SearchError::Request {
                message: format!("SerpAPI error: {}", error),
            });
        }

        let Some(organic) = body.get("organic_results").and_then(|v| v.as_array()) else {
            return Ok(Vec::new());
        };

        Ok(organic
            .iter()
            .filter_map(|item| {
                let title = item.get("title")?.as_str()?;
                let url = item.get("link")?.as_str()?;
                let snippet = item.get("snippet").and_then(|v| v.as_str()).unwrap_or("");
                Some(SearchResult::new(title, snippet, url))
            })
            .take(max_results)
            .collect())
    }
}

#[async_trait]
impl SearchProvider for SerpApiProvider {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, SearchError> {
        debug!(query, max_results, "Querying SerpAPI");

        let response = self
            .client
            .get(self.request_url(query, max_results))
            .send()
            .await
            .map_err(|e| SearchError::Request {
                message: format!("Search request failed: {}", e.without_url()),
            })?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(SearchError::AuthFailed {
                provider: "SerpAPI".to_string(),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchError::ResponseParse {
                message: format!("Failed to parse search response: {}", e),
            })?;

        if !status.is_success() {
            let detail = body
                .get("error")
                .and_then(|v| v.as_str())
                .unwrap_or("no details");
            return Err(SearchError::Request {
                message: format!("HTTP {} from SerpAPI: {}", status, detail),
            });
        }

        Self::parse_results(&body, max_results)
    }

    fn name(&self) -> &str {
        "serpapi"
    }
}

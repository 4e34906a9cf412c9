//! DuckDuckGo Instant Answer search provider.
//!
//! No API key required. The instant answer API returns an abstract plus
//! related topics rather than a ranked page of links, so results are built
//! from those in the order DuckDuckGo returns them.

use super::{SearchConfig, SearchProvider, build_client};
use crate::error::SearchError;
use crate::types::SearchResult;
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.duckduckgo.com/";

pub struct DuckDuckGoProvider {
    client: reqwest::Client,
    base_url: String,
}

impl DuckDuckGoProvider {
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        })
    }

    fn request_url(&self, query: &str) -> String {
        format!(
            "{}?q={}&format=json&no_html=1&skip_disambig=1",
            self.base_url,
            urlencoding::encode(query)
        )
    }

    /// Extract records from an instant answer body: the abstract first, then
    /// related topics (flattening topic groups), then direct results.
    fn parse_results(body: &Value, max_results: usize) -> Vec<SearchResult> {
        let mut results = Vec::new();

        if let Some(abstract_text) = body.get("AbstractText").and_then(|v| v.as_str())
            && !abstract_text.is_empty()
        {
            let heading = body
                .get("Heading")
                .and_then(|v| v.as_str())
                .filter(|h| !h.is_empty())
                .or_else(|| body.get("AbstractSource").and_then(|v| v.as_str()))
                .unwrap_or("Abstract");
            let url = body
                .get("AbstractURL")
                .and_then(|v| v.as_str())
                .unwrap_or("");
            results.push(SearchResult::new(heading, abstract_text, url));
        }

        let mut topics: Vec<&Value> = Vec::new();
        if let Some(related) = body.get("RelatedTopics").and_then(|v| v.as_array()) {
            for topic in related {
                match topic.get("Topics").and_then(|v| v.as_array()) {
                    Some(group) => topics.extend(group),
                    None => topics.push(topic),
                }
            }
        }
        if let Some(direct) = body.get("Results").and_then(|v| v.as_array()) {
            topics.extend(direct);
        }

        for topic in topics {
            let (Some(text), Some(url)) = (
                topic.get("Text").and_then(|v| v.as_str()),
                topic.get("FirstURL").and_then(|v| v.as_str()),
            ) else {
                continue;
            };
            let title = text.split(" - ").next().unwrap_or(text);
            results.push(SearchResult::new(title, text, url));
        }

        results.truncate(max_results);
        results
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoProvider {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, SearchError> {
        debug!(query, "Querying DuckDuckGo");

        let response = self
            .client
            .get(self.request_url(query))
            .send()
            .await
            .map_err(|e| SearchError::Request {
                message: format!("Search request failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Request {
                message: format!("HTTP {} from DuckDuckGo", status),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchError::ResponseParse {
                message: format!("Failed to parse search response: {}", e),
            })?;

        Ok(Self::parse_results(&body, max_results))
    }

    fn name(&self) -> &str {
        "duckduckgo"
    }
}

//! Retrieval: run one query against the search collaborator.

use crate::error::StepError;
use crate::search::SearchProvider;
use crate::types::SearchResult;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Fetches up to `max_results` records for one query, in provider order.
#[async_trait]
pub trait Searcher: Send + Sync {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, StepError>;
}

/// Searcher backed by a `SearchProvider`. Collaborator errors propagate.
pub struct WebSearcher {
    provider: Arc<dyn SearchProvider>,
}

impl WebSearcher {
    pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Searcher for WebSearcher {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, StepError> {
        let mut results = self.provider.search(query, max_results).await?;
        results.truncate(max_results);
        debug!(
            provider = self.provider.name(),
            query,
            results = results.len(),
            "Search complete"
        );
        Ok(results)
    }
}

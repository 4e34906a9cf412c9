//! Placeholder search provider.
//!
//! Produces at most three synthetic records per query without touching the
//! network, so the pipeline can run end to end with only a model key.

use super::SearchProvider;
use crate::error::SearchError;
use crate::types::SearchResult;
use async_trait::async_trait;

const MAX_PLACEHOLDER_RESULTS: usize = 3;

#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderSearchProvider;

#[async_trait]
impl SearchProvider for PlaceholderSearchProvider {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, SearchError> {
        Ok((1..=max_results.min(MAX_PLACEHOLDER_RESULTS))
            .map(|i| SearchResult {
                title: format!("Result {i} for {query}"),
                snippet: format!(
                    "This is a snippet of information related to {query}. \
                     It contains relevant details that would be useful for research."
                ),
                url: format!("https://example.com/result-{i}"),
            })
            .collect())
    }

    fn name(&self) -> &str {
        "placeholder"
    }
}

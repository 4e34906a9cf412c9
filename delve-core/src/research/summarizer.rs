//! Summarization: condense the accumulated results into one paragraph.

use super::prompts::summarize_prompt;
use crate::brain::Brain;
use crate::error::StepError;
use crate::types::SearchResult;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(
        &self,
        topic: &str,
        results: &[SearchResult],
    ) -> Result<String, StepError>;
}

/// Model-backed summarizer. Collaborator errors propagate.
pub struct LlmSummarizer {
    brain: Arc<Brain>,
    model: Option<String>,
}

impl LlmSummarizer {
    pub fn new(brain: Arc<Brain>, model: Option<String>) -> Self {
        Self { brain, model }
    }
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    async fn summarize(
        &self,
        topic: &str,
        results: &[SearchResult],
    ) -> Result<String, StepError> {
        let summary = self
            .brain
            .generate(&summarize_prompt(topic, results), self.model.as_deref())
            .await?;
        Ok(summary.trim().to_string())
    }
}

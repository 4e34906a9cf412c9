//! Query expansion: rewrite a subtopic as a richer search query.

use super::prompts::expand_prompt;
use crate::brain::Brain;
use crate::error::StepError;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Turns one subtopic into one search query.
#[async_trait]
pub trait QueryExpander: Send + Sync {
    async fn expand(&self, subtopic: &str) -> Result<String, StepError>;
}

/// Model-backed expander. Collaborator errors propagate.
pub struct LlmQueryExpander {
    brain: Arc<Brain>,
    model: Option<String>,
}

impl LlmQueryExpander {
    pub fn new(brain: Arc<Brain>, model: Option<String>) -> Self {
        Self { brain, model }
    }
}

#[async_trait]
impl QueryExpander for LlmQueryExpander {
    async fn expand(&self, subtopic: &str) -> Result<String, StepError> {
        let reply = self
            .brain
            .generate(&expand_prompt(subtopic), self.model.as_deref())
            .await?;
        let query = strip_matching_quotes(reply.trim()).to_string();
        debug!(subtopic, query = %query, "Query expanded");
        Ok(query)
    }
}

/// Strip one pair of surrounding `"` or `'` if both ends match.
pub fn strip_matching_quotes(text: &str) -> &str {
    for quote in ['"', '\''] {
        if text.len() >= 2
            && let Some(inner) = text
                .strip_prefix(quote)
                .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    text
}

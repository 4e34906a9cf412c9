//! Topic decomposition: split a topic into 3–5 searchable subtopics.

use super::parsing::{parse_string_list, truncate_for_log};
use super::prompts::decompose_prompt;
use crate::brain::Brain;
use crate::error::StepError;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

pub const MIN_SUBTOPICS: usize = 3;
pub const MAX_SUBTOPICS: usize = 5;

/// Splits a topic into subtopics.
#[async_trait]
pub trait TopicDecomposer: Send + Sync {
    async fn decompose(&self, topic: &str) -> Result<Vec<String>, StepError>;
}

/// The deterministic substitute used whenever decomposition fails.
pub fn fallback_subtopics(topic: &str) -> Vec<String> {
    vec![
        format!("{topic} overview"),
        format!("{topic} definition"),
        format!("{topic} examples"),
    ]
}

/// Model-backed decomposer.
///
/// Never fails: a collaborator error, an unparseable reply, or fewer than
/// three usable entries all produce `fallback_subtopics`. Replies with more
/// than five entries are cut to five.
pub struct LlmTopicDecomposer {
    brain: Arc<Brain>,
    model: Option<String>,
}

impl LlmTopicDecomposer {
    pub fn new(brain: Arc<Brain>, model: Option<String>) -> Self {
        Self { brain, model }
    }

    fn interpret(topic: &str, reply: &str) -> Result<Vec<String>, StepError> {
        let mut subtopics: Vec<String> = parse_string_list(reply)?
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if subtopics.len() < MIN_SUBTOPICS {
            return Err(StepError::parse(format!(
                "expected at least {MIN_SUBTOPICS} subtopics for '{topic}', got {}",
                subtopics.len()
            )));
        }
        subtopics.truncate(MAX_SUBTOPICS);
        Ok(subtopics)
    }
}

#[async_trait]
impl TopicDecomposer for LlmTopicDecomposer {
    async fn decompose(&self, topic: &str) -> Result<Vec<String>, StepError> {
        let reply = match self
            .brain
            .generate(&decompose_prompt(topic), self.model.as_deref())
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                warn!(topic, error = %e, "Decomposition request failed, using fallback subtopics");
                return Ok(fallback_subtopics(topic));
            }
        };

        match Self::interpret(topic, &reply) {
            Ok(subtopics) => {
                debug!(topic, count = subtopics.len(), "Topic decomposed");
                Ok(subtopics)
            }
            Err(e) => {
                warn!(
                    topic,
                    error = %e,
                    reply = %truncate_for_log(&reply),
                    "Could not interpret decomposition, using fallback subtopics"
                );
                Ok(fallback_subtopics(topic))
            }
        }
    }
}

//! Critique: evaluate a summary and decide whether to search again.

use super::parsing::{first_json_value, strip_code_fences, truncate_for_log};
use super::prompts::critique_prompt;
use crate::brain::Brain;
use crate::error::StepError;
use crate::types::SearchResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// How many leading search results the critic is shown.
pub const CRITIQUE_SAMPLE_SIZE: usize = 3;

const MISSING_CRITIQUE: &str = "No critique provided.";

/// The critic's structured verdict on a summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Critique {
    pub critique: String,
    pub needs_refinement: bool,
    pub refinement_queries: Vec<String>,
}

/// What the workflow does after a critique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Stop,
    Refine(Vec<String>),
}

impl Critique {
    /// A terminal critique carrying only a note.
    pub fn note(critique: impl Into<String>) -> Self {
        Self {
            critique: critique.into(),
            needs_refinement: false,
            refinement_queries: Vec::new(),
        }
    }

    /// The critique recorded when the critic itself failed.
    pub fn unavailable(error: &StepError) -> Self {
        Self::note(format!("Critique unavailable: {error}"))
    }

    /// Refine only when asked to and given at least one query.
    pub fn verdict(&self) -> Verdict {
        if self.needs_refinement && !self.refinement_queries.is_empty() {
            Verdict::Refine(self.refinement_queries.clone())
        } else {
            Verdict::Stop
        }
    }

    /// Interpret a critic reply.
    ///
    /// Accepts a JSON object, optionally fenced or embedded in prose. Missing
    /// fields take defaults; `needs_refinement` without any queries gets two
    /// generic follow-ups derived from `topic`.
    pub fn parse(topic: &str, reply: &str) -> Result<Self, StepError> {
        let object: Map<String, Value> = serde_json::from_str(strip_code_fences(reply))
            .ok()
            .or_else(|| first_json_value(reply, '{'))
            .ok_or_else(|| StepError::parse("critique holds no JSON object"))?;

        let critique = match object.get("critique") {
            Some(Value::String(text)) if !text.trim().is_empty() => text.trim().to_string(),
            Some(Value::Null) | None => MISSING_CRITIQUE.to_string(),
            Some(Value::String(_)) => MISSING_CRITIQUE.to_string(),
            Some(other) => other.to_string(),
        };

        let needs_refinement = match object.get("needs_refinement") {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
            _ => false,
        };

        let refinement_queries = if !needs_refinement {
            Vec::new()
        } else {
            match object.get("refinement_queries") {
                Some(Value::Array(items)) => items
                    .iter()
                    .filter_map(|q| q.as_str())
                    .map(|q| q.trim().to_string())
                    .filter(|q| !q.is_empty())
                    .collect(),
                Some(Value::String(single)) if !single.trim().is_empty() => {
                    vec![single.trim().to_string()]
                }
                Some(Value::Null) | None => fallback_refinement_queries(topic),
                Some(_) => Vec::new(),
            }
        };

        Ok(Self {
            critique,
            needs_refinement,
            refinement_queries,
        })
    }
}

/// Follow-up queries used when the critic asks to refine without saying how.
pub fn fallback_refinement_queries(topic: &str) -> Vec<String> {
    vec![
        format!("{topic} latest research"),
        format!("{topic} critiques"),
    ]
}

/// Evaluates a summary against a sample of the results behind it.
#[async_trait]
pub trait Critic: Send + Sync {
    async fn critique(
        &self,
        topic: &str,
        summary: &str,
        sample: &[SearchResult],
    ) -> Result<Critique, StepError>;
}

/// Model-backed critic.
///
/// Never fails: a collaborator error yields `Critique::unavailable` and an
/// unparseable reply becomes the critique text verbatim. Both stop the loop.
pub struct LlmCritic {
    brain: Arc<Brain>,
    model: Option<String>,
}

impl LlmCritic {
    pub fn new(brain: Arc<Brain>, model: Option<String>) -> Self {
        Self { brain, model }
    }
}

#[async_trait]
impl Critic for LlmCritic {
    async fn critique(
        &self,
        topic: &str,
        summary: &str,
        sample: &[SearchResult],
    ) -> Result<Critique, StepError> {
        let prompt = critique_prompt(topic, summary, sample);
        let reply = match self.brain.generate(&prompt, self.model.as_deref()).await {
            Ok(reply) => reply,
            Err(e) => {
                let err = StepError::from(e);
                warn!(topic, error = %err, "Critique request failed, stopping refinement");
                return Ok(Critique::unavailable(&err));
            }
        };

        match Critique::parse(topic, &reply) {
            Ok(critique) => {
                debug!(
                    topic,
                    needs_refinement = critique.needs_refinement,
                    queries = critique.refinement_queries.len(),
                    "Critique parsed"
                );
                Ok(critique)
            }
            Err(e) => {
                warn!(
                    topic,
                    error = %e,
                    reply = %truncate_for_log(&reply),
                    "Could not parse critique, keeping raw text"
                );
                let raw = reply.trim();
                Ok(Critique::note(if raw.is_empty() {
                    MISSING_CRITIQUE
                } else {
                    raw
                }))
            }
        }
    }
}

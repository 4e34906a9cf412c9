//! Research pipeline: topic in, critiqued summary out.
//!
//! A run moves through a fixed sequence of steps with one conditional
//! back-edge:
//! 1. **Decompose**: split the topic into 3–5 subtopics
//! 2. **Expand**: rewrite each subtopic as a search query
//! 3. **Search**: fetch results per query and append them, in query order
//! 4. **Summarize**: condense every accumulated result into one paragraph
//! 5. **Critique**: evaluate the summary; either stop, or replace the
//!    query set and go back to Search
//!
//! Each step sits behind a single-operation trait so the engine can run with
//! any mix of model-backed implementations and test doubles.

pub mod critic;
pub mod decomposition;
pub mod engine;
pub mod expansion;
pub mod output;
pub mod parsing;
pub mod prompts;
pub mod retrieval;
pub mod state;
pub mod summarizer;

use serde::{Deserialize, Serialize};

pub use critic::{Critic, Critique, LlmCritic, Verdict};
pub use decomposition::{LlmTopicDecomposer, TopicDecomposer, fallback_subtopics};
pub use engine::{PipelineSteps, ResearchEngine};
pub use expansion::{LlmQueryExpander, QueryExpander};
pub use output::{OutputFormat, ResearchReport};
pub use retrieval::{Searcher, WebSearcher};
pub use state::{NoOpResearchCallback, PipelineState, PipelineStep, ResearchCallback};
pub use summarizer::{LlmSummarizer, Summarizer};

/// Configuration for research runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchConfig {
    /// Maximum number of Critique → Search loops per run.
    pub max_refinements: usize,
    /// Expand subtopics and search queries concurrently.
    pub concurrent_queries: bool,
    /// Results per query when a caller does not say.
    pub default_max_results: usize,
    /// Per-step model overrides.
    pub models: StepModels,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            max_refinements: 2,
            concurrent_queries: true,
            default_max_results: 5,
            models: StepModels::default(),
        }
    }
}

/// Model overrides for individual steps. `None` uses the provider default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StepModels {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decompose: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summarize: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub critique: Option<String>,
}

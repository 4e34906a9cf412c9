//! Pipeline state and progress reporting.

use super::critic::Critique;
use crate::types::SearchResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A state of the research workflow.
///
/// `Decompose` is the only initial state and `Done` the only terminal one.
/// Also used to name the step a `PipelineFailure` came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStep {
    Decompose,
    Expand,
    Search,
    Summarize,
    Critique,
    Done,
}

impl PipelineStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStep::Decompose => "decompose",
            PipelineStep::Expand => "expand",
            PipelineStep::Search => "search",
            PipelineStep::Summarize => "summarize",
            PipelineStep::Critique => "critique",
            PipelineStep::Done => "done",
        }
    }
}

impl std::fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The record threaded through one research run.
///
/// Fields are only appended to or wholesale-replaced by the step that owns
/// them; one instance exists per run and is never shared.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineState {
    pub id: Uuid,
    pub topic: String,
    pub max_results: usize,
    pub subtopics: Vec<String>,
    /// Replaced, not extended, when the critic asks for refinement.
    pub expanded_queries: Vec<String>,
    /// Appended to on every search pass.
    pub search_results: Vec<SearchResult>,
    pub summary: String,
    pub critique: String,
    pub needs_refinement: bool,
    /// Set only while `needs_refinement` is true.
    pub refinement_queries: Option<Vec<String>>,
    pub refinement_rounds: usize,
    pub started_at: DateTime<Utc>,
}

impl PipelineState {
    pub fn new(topic: impl Into<String>, max_results: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            topic: topic.into(),
            max_results,
            subtopics: Vec::new(),
            expanded_queries: Vec::new(),
            search_results: Vec::new(),
            summary: String::new(),
            critique: String::new(),
            needs_refinement: false,
            refinement_queries: None,
            refinement_rounds: 0,
            started_at: Utc::now(),
        }
    }

    /// Overwrite the critic-owned fields.
    pub fn record_critique(&mut self, critique: Critique) {
        self.critique = critique.critique;
        self.needs_refinement = critique.needs_refinement;
        self.refinement_queries = critique
            .needs_refinement
            .then_some(critique.refinement_queries);
    }
}

/// Callback trait for progress updates during a run.
pub trait ResearchCallback: Send + Sync {
    /// Called when the workflow enters a new state.
    fn on_phase_change(&self, step: PipelineStep);
    /// Called after each query has been searched.
    fn on_query_searched(&self, query: &str, results: usize);
    /// Called when the critic's queries replace the active query set.
    fn on_refinement(&self, round: usize, queries: &[String]);
}

/// No-op callback.
pub struct NoOpResearchCallback;

impl ResearchCallback for NoOpResearchCallback {
    fn on_phase_change(&self, _step: PipelineStep) {}
    fn on_query_searched(&self, _query: &str, _results: usize) {}
    fn on_refinement(&self, _round: usize, _queries: &[String]) {}
}

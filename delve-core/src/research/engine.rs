//! Research engine: drives the decompose/expand/search/summarize/critique
//! state machine for one run.

use super::critic::{CRITIQUE_SAMPLE_SIZE, Critic, Critique, LlmCritic, Verdict};
use super::decomposition::{LlmTopicDecomposer, TopicDecomposer, fallback_subtopics};
use super::expansion::{LlmQueryExpander, QueryExpander};
use super::output::ResearchReport;
use super::retrieval::{Searcher, WebSearcher};
use super::state::{NoOpResearchCallback, PipelineState, PipelineStep, ResearchCallback};
use super::summarizer::{LlmSummarizer, Summarizer};
use super::{ResearchConfig, StepModels};
use crate::brain::Brain;
use crate::config::DelveConfig;
use crate::error::{CollaboratorError, DelveError, StepError};
use crate::providers::create_provider;
use crate::search::{SearchProvider, create_search_provider};
use crate::types::SearchResult;
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One implementation of each pipeline step.
#[derive(Clone)]
pub struct PipelineSteps {
    pub decomposer: Arc<dyn TopicDecomposer>,
    pub expander: Arc<dyn QueryExpander>,
    pub searcher: Arc<dyn Searcher>,
    pub summarizer: Arc<dyn Summarizer>,
    pub critic: Arc<dyn Critic>,
}

impl PipelineSteps {
    /// Model-backed steps sharing one `Brain`, searching through `search`.
    pub fn from_collaborators(
        brain: Arc<Brain>,
        search: Arc<dyn SearchProvider>,
        models: &StepModels,
    ) -> Self {
        Self {
            decomposer: Arc::new(LlmTopicDecomposer::new(
                brain.clone(),
                models.decompose.clone(),
            )),
            expander: Arc::new(LlmQueryExpander::new(brain.clone(), models.expand.clone())),
            searcher: Arc::new(WebSearcher::new(search)),
            summarizer: Arc::new(LlmSummarizer::new(
                brain.clone(),
                models.summarize.clone(),
            )),
            critic: Arc::new(LlmCritic::new(brain, models.critique.clone())),
        }
    }
}

/// Runs research pipelines.
///
/// Holds no per-run state, so one engine can serve concurrent runs.
pub struct ResearchEngine {
    steps: PipelineSteps,
    config: ResearchConfig,
    callback: Arc<dyn ResearchCallback>,
}

impl ResearchEngine {
    pub fn new(steps: PipelineSteps, config: ResearchConfig) -> Self {
        Self {
            steps,
            config,
            callback: Arc::new(NoOpResearchCallback),
        }
    }

    /// Build the model-backed engine described by `config`.
    ///
    /// Provider credentials are resolved here; a missing key is an error.
    pub fn from_config(config: &DelveConfig) -> Result<Self, DelveError> {
        config.validate()?;
        let provider = create_provider(&config.llm).map_err(CollaboratorError::from)?;
        let brain = Brain::new(provider)
            .with_temperature(config.llm.temperature)
            .with_max_tokens(config.llm.max_tokens);
        let search = create_search_provider(&config.search).map_err(CollaboratorError::from)?;

        let steps =
            PipelineSteps::from_collaborators(Arc::new(brain), search, &config.research.models);
        Ok(Self::new(steps, config.research.clone()))
    }

    pub fn with_callback(mut self, callback: Arc<dyn ResearchCallback>) -> Self {
        self.callback = callback;
        self
    }

    pub fn config(&self) -> &ResearchConfig {
        &self.config
    }

    /// Research `topic`, fetching up to `max_results` records per query.
    ///
    /// Fails with `InvalidInput` for a blank topic or a non-positive
    /// `max_results`, and with `PipelineFailure` when the expander, searcher,
    /// or summarizer fails. Decomposer and critic failures fall back instead.
    pub async fn run(&self, topic: &str, max_results: i64) -> Result<ResearchReport, DelveError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(DelveError::invalid_input("topic must not be empty"));
        }
        if max_results <= 0 {
            return Err(DelveError::invalid_input(format!(
                "max_results must be greater than 0, got {max_results}"
            )));
        }
        let max_results = usize::try_from(max_results).map_err(|_| {
            DelveError::invalid_input(format!("max_results is too large: {max_results}"))
        })?;

        let mut state = PipelineState::new(topic, max_results);
        info!(run_id = %state.id, topic, max_results, "Research run started");

        let mut step = PipelineStep::Decompose;
        while step != PipelineStep::Done {
            let current = step;
            self.callback.on_phase_change(current);
            step = self
                .advance(current, &mut state)
                .await
                .map_err(|source| DelveError::pipeline(current, source))?;
        }
        self.callback.on_phase_change(PipelineStep::Done);

        info!(
            run_id = %state.id,
            subtopics = state.subtopics.len(),
            results = state.search_results.len(),
            refinement_rounds = state.refinement_rounds,
            elapsed_ms = (chrono::Utc::now() - state.started_at).num_milliseconds(),
            "Research run complete"
        );
        Ok(state.into())
    }

    /// Execute `step` against `state` and return the next state.
    async fn advance(
        &self,
        step: PipelineStep,
        state: &mut PipelineState,
    ) -> Result<PipelineStep, StepError> {
        match step {
            PipelineStep::Decompose => {
                state.subtopics = self.decompose(&state.topic).await;
                Ok(PipelineStep::Expand)
            }
            PipelineStep::Expand => {
                state.expanded_queries = self.expand_all(&state.subtopics).await?;
                Ok(PipelineStep::Search)
            }
            PipelineStep::Search => {
                let results = self
                    .search_all(&state.expanded_queries, state.max_results)
                    .await?;
                state.search_results.extend(results);
                Ok(PipelineStep::Summarize)
            }
            PipelineStep::Summarize => {
                state.summary = self
                    .steps
                    .summarizer
                    .summarize(&state.topic, &state.search_results)
                    .await?;
                Ok(PipelineStep::Critique)
            }
            PipelineStep::Critique => {
                let critique = self.critique(state).await;
                let verdict = critique.verdict();
                state.record_critique(critique);
                Ok(self.after_critique(state, verdict))
            }
            PipelineStep::Done => Ok(PipelineStep::Done),
        }
    }

    async fn decompose(&self, topic: &str) -> Vec<String> {
        match self.steps.decomposer.decompose(topic).await {
            Ok(subtopics) => subtopics,
            Err(e) => {
                warn!(topic, error = %e, "Decomposer failed, using fallback subtopics");
                fallback_subtopics(topic)
            }
        }
    }

    async fn expand_all(&self, subtopics: &[String]) -> Result<Vec<String>, StepError> {
        let expander = &self.steps.expander;
        if self.config.concurrent_queries {
            try_join_all(subtopics.iter().map(|s| expander.expand(s))).await
        } else {
            let mut queries = Vec::with_capacity(subtopics.len());
            for subtopic in subtopics {
                queries.push(expander.expand(subtopic).await?);
            }
            Ok(queries)
        }
    }

    /// Search every query and concatenate the results in query order.
    async fn search_all(
        &self,
        queries: &[String],
        max_results: usize,
    ) -> Result<Vec<SearchResult>, StepError> {
        let per_query = if self.config.concurrent_queries {
            try_join_all(queries.iter().map(|q| self.search_one(q, max_results))).await?
        } else {
            let mut per_query = Vec::with_capacity(queries.len());
            for query in queries {
                per_query.push(self.search_one(query, max_results).await?);
            }
            per_query
        };
        Ok(per_query.into_iter().flatten().collect())
    }

    async fn search_one(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, StepError> {
        let results = self.steps.searcher.search(query, max_results).await?;
        self.callback.on_query_searched(query, results.len());
        Ok(results)
    }

    async fn critique(&self, state: &PipelineState) -> Critique {
        let sample_len = state.search_results.len().min(CRITIQUE_SAMPLE_SIZE);
        let sample = &state.search_results[..sample_len];
        match self
            .steps
            .critic
            .critique(&state.topic, &state.summary, sample)
            .await
        {
            Ok(critique) => critique,
            Err(e) => {
                warn!(topic = %state.topic, error = %e, "Critic failed, stopping refinement");
                Critique::unavailable(&e)
            }
        }
    }

    /// Choose between `Search` (with the critic's queries) and `Done`.
    fn after_critique(&self, state: &mut PipelineState, verdict: Verdict) -> PipelineStep {
        match verdict {
            Verdict::Stop => {
                debug!(run_id = %state.id, "Critic satisfied");
                PipelineStep::Done
            }
            Verdict::Refine(_) if state.refinement_rounds >= self.config.max_refinements => {
                warn!(
                    run_id = %state.id,
                    max_refinements = self.config.max_refinements,
                    "Refinement limit reached, finishing with current summary"
                );
                PipelineStep::Done
            }
            Verdict::Refine(queries) => {
                state.refinement_rounds += 1;
                info!(
                    run_id = %state.id,
                    round = state.refinement_rounds,
                    queries = queries.len(),
                    "Critic requested refinement"
                );
                self.callback.on_refinement(state.refinement_rounds, &queries);
                state.expanded_queries = queries;
                PipelineStep::Search
            }
        }
    }
}

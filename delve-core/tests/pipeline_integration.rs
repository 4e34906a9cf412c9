//! Integration tests for the research pipeline.
//!
//! These drive `ResearchEngine::run` end-to-end with scripted step doubles,
//! verifying the Decompose → Expand → Search → Summarize → Critique cycle and
//! its refinement back-edge.

use async_trait::async_trait;
use delve_core::brain::{Brain, MockLlmProvider};
use delve_core::error::{DelveError, LlmError, SearchError, StepError};
use delve_core::research::{
    Critic, Critique, LlmCritic, PipelineStep, PipelineSteps, QueryExpander, ResearchCallback,
    ResearchConfig, ResearchEngine, Searcher, Summarizer, TopicDecomposer, fallback_subtopics,
};
use delve_core::types::SearchResult;
use pretty_assertions::assert_eq;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

// --- Step doubles ---

struct FixedDecomposer(Vec<String>);

#[async_trait]
impl TopicDecomposer for FixedDecomposer {
    async fn decompose(&self, _topic: &str) -> Result<Vec<String>, StepError> {
        Ok(self.0.clone())
    }
}

struct FailingDecomposer;

#[async_trait]
impl TopicDecomposer for FailingDecomposer {
    async fn decompose(&self, _topic: &str) -> Result<Vec<String>, StepError> {
        Err(StepError::parse("not a list"))
    }
}

struct EchoExpander;

#[async_trait]
impl QueryExpander for EchoExpander {
    async fn expand(&self, subtopic: &str) -> Result<String, StepError> {
        Ok(subtopic.to_string())
    }
}

struct FailingExpander;

#[async_trait]
impl QueryExpander for FailingExpander {
    async fn expand(&self, _subtopic: &str) -> Result<String, StepError> {
        Err(LlmError::Connection {
            message: "upstream unavailable".into(),
        }
        .into())
    }
}

/// Returns `max_results` numbered records per query and logs each query.
#[derive(Default)]
struct CountingSearcher {
    queries: Mutex<Vec<String>>,
}

impl CountingSearcher {
    fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Searcher for CountingSearcher {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, StepError> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok((1..=max_results)
            .map(|i| {
                SearchResult::new(
                    format!("{query} #{i}"),
                    format!("About {query}"),
                    format!("https://example.com/{}/{i}", query.replace(' ', "-")),
                )
            })
            .collect())
    }
}

struct FailingSearcher;

#[async_trait]
impl Searcher for FailingSearcher {
    async fn search(
        &self,
        _query: &str,
        _max_results: usize,
    ) -> Result<Vec<SearchResult>, StepError> {
        Err(SearchError::Request {
            message: "connection reset".into(),
        }
        .into())
    }
}

/// Summarizes by counting what it was given.
struct CountingSummarizer;

#[async_trait]
impl Summarizer for CountingSummarizer {
    async fn summarize(&self, topic: &str, results: &[SearchResult]) -> Result<String, StepError> {
        Ok(format!("{topic}: {} sources", results.len()))
    }
}

struct FixedSummarizer(&'static str);

#[async_trait]
impl Summarizer for FixedSummarizer {
    async fn summarize(&self, _topic: &str, _results: &[SearchResult]) -> Result<String, StepError> {
        Ok(self.0.to_string())
    }
}

/// Plays back critiques in order, then stops.
struct ScriptedCritic {
    script: Mutex<VecDeque<Critique>>,
    samples: Mutex<Vec<usize>>,
}

impl ScriptedCritic {
    fn new(script: Vec<Critique>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            samples: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Critic for ScriptedCritic {
    async fn critique(
        &self,
        _topic: &str,
        _summary: &str,
        sample: &[SearchResult],
    ) -> Result<Critique, StepError> {
        self.samples.lock().unwrap().push(sample.len());
        Ok(self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Critique::note("Done.")))
    }
}

#[derive(Default)]
struct RecordingCallback {
    phases: Mutex<Vec<PipelineStep>>,
    refinements: Mutex<Vec<(usize, Vec<String>)>>,
}

impl ResearchCallback for RecordingCallback {
    fn on_phase_change(&self, step: PipelineStep) {
        self.phases.lock().unwrap().push(step);
    }
    fn on_query_searched(&self, _query: &str, _results: usize) {}
    fn on_refinement(&self, round: usize, queries: &[String]) {
        self.refinements
            .lock()
            .unwrap()
            .push((round, queries.to_vec()));
    }
}

fn refine(queries: &[&str]) -> Critique {
    Critique {
        critique: "Needs more.".into(),
        needs_refinement: true,
        refinement_queries: queries.iter().map(|q| q.to_string()).collect(),
    }
}

fn steps(
    subtopics: &[&str],
    searcher: Arc<dyn Searcher>,
    summarizer: Arc<dyn Summarizer>,
    critic: Arc<dyn Critic>,
) -> PipelineSteps {
    PipelineSteps {
        decomposer: Arc::new(FixedDecomposer(
            subtopics.iter().map(|s| s.to_string()).collect(),
        )),
        expander: Arc::new(EchoExpander),
        searcher,
        summarizer,
        critic,
    }
}

// --- Integration Tests ---

#[tokio::test]
async fn test_end_to_end_without_refinement() {
    let searcher = Arc::new(CountingSearcher::default());
    let critic = Arc::new(ScriptedCritic::new(vec![Critique::note("Solid overview.")]));
    let engine = ResearchEngine::new(
        steps(
            &["qubits", "quantum algorithms"],
            searcher.clone(),
            Arc::new(FixedSummarizer("Quantum computing is...")),
            critic.clone(),
        ),
        ResearchConfig::default(),
    );

    let report = engine.run("quantum computing", 2).await.unwrap();

    assert_eq!(report.topic, "quantum computing");
    assert_eq!(report.subtopics, vec!["qubits", "quantum algorithms"]);
    assert_eq!(report.search_results.len(), 4);
    assert_eq!(report.search_results[0].title, "qubits #1");
    assert_eq!(report.search_results[3].title, "quantum algorithms #2");
    assert_eq!(report.summary, "Quantum computing is...");
    assert_eq!(report.critique, "Solid overview.");
    assert_eq!(report.refinement_rounds, 0);
    // The critic only sees the leading sample
    assert_eq!(*critic.samples.lock().unwrap(), vec![3]);
}

#[tokio::test]
async fn test_refinement_appends_results_and_resummarizes() {
    let searcher = Arc::new(CountingSearcher::default());
    let critic = Arc::new(ScriptedCritic::new(vec![
        refine(&["error correction"]),
        Critique::note("Covered."),
    ]));
    let callback = Arc::new(RecordingCallback::default());
    let engine = ResearchEngine::new(
        steps(
            &["qubits", "gates"],
            searcher.clone(),
            Arc::new(CountingSummarizer),
            critic,
        ),
        ResearchConfig::default(),
    )
    .with_callback(callback.clone());

    let report = engine.run("quantum", 1).await.unwrap();

    assert_eq!(
        searcher.queries(),
        vec!["qubits", "gates", "error correction"]
    );
    let titles: Vec<_> = report.search_results.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["qubits #1", "gates #1", "error correction #1"]);
    // Second summary covers everything accumulated so far
    assert_eq!(report.summary, "quantum: 3 sources");
    assert_eq!(report.critique, "Covered.");
    assert_eq!(report.refinement_rounds, 1);
    assert_eq!(
        *callback.refinements.lock().unwrap(),
        vec![(1, vec!["error correction".to_string()])]
    );

    assert_eq!(
        *callback.phases.lock().unwrap(),
        vec![
            PipelineStep::Decompose,
            PipelineStep::Expand,
            PipelineStep::Search,
            PipelineStep::Summarize,
            PipelineStep::Critique,
            PipelineStep::Search,
            PipelineStep::Summarize,
            PipelineStep::Critique,
            PipelineStep::Done,
        ]
    );
}

#[tokio::test]
async fn test_refinement_limit_stops_loop() {
    let critic = Arc::new(ScriptedCritic::new(vec![
        refine(&["more"]),
        refine(&["more"]),
        refine(&["more"]),
        refine(&["more"]),
    ]));
    let config = ResearchConfig {
        max_refinements: 1,
        ..ResearchConfig::default()
    };
    let engine = ResearchEngine::new(
        steps(
            &["a"],
            Arc::new(CountingSearcher::default()),
            Arc::new(CountingSummarizer),
            critic,
        ),
        config,
    );

    let report = engine.run("topic", 1).await.unwrap();
    assert_eq!(report.refinement_rounds, 1);
    assert_eq!(report.search_results.len(), 2);
    assert_eq!(report.critique, "Needs more.");
}

#[tokio::test]
async fn test_unparseable_critique_terminates() {
    let provider = MockLlmProvider::with_response("This summary reads fine to me.");
    let brain = Arc::new(Brain::new(Arc::new(provider)));
    let searcher = Arc::new(CountingSearcher::default());
    let pipeline = steps(
        &["a", "b", "c"],
        searcher.clone(),
        Arc::new(CountingSummarizer),
        Arc::new(LlmCritic::new(brain, None)),
    );
    let engine = ResearchEngine::new(pipeline, ResearchConfig::default());

    let report = engine.run("topic", 2).await.unwrap();
    assert_eq!(report.critique, "This summary reads fine to me.");
    assert_eq!(report.refinement_rounds, 0);
    assert_eq!(searcher.queries().len(), 3);
}

#[tokio::test]
async fn test_decomposer_failure_uses_fallback_subtopics() {
    let mut pipeline = steps(
        &[],
        Arc::new(CountingSearcher::default()),
        Arc::new(CountingSummarizer),
        Arc::new(ScriptedCritic::new(vec![])),
    );
    pipeline.decomposer = Arc::new(FailingDecomposer);
    let engine = ResearchEngine::new(pipeline, ResearchConfig::default());

    let report = engine.run("solar power", 1).await.unwrap();
    assert_eq!(report.subtopics, fallback_subtopics("solar power"));
}

#[tokio::test]
async fn test_expander_failure_names_step() {
    let searcher = Arc::new(CountingSearcher::default());
    let mut pipeline = steps(
        &["a", "b"],
        searcher.clone(),
        Arc::new(CountingSummarizer),
        Arc::new(ScriptedCritic::new(vec![])),
    );
    pipeline.expander = Arc::new(FailingExpander);
    let engine = ResearchEngine::new(pipeline, ResearchConfig::default());

    let err = engine.run("topic", 3).await.unwrap_err();
    assert_eq!(err.failed_step(), Some(PipelineStep::Expand));
    assert!(err.to_string().contains("upstream unavailable"));
    assert!(searcher.queries().is_empty());
}

#[tokio::test]
async fn test_search_failure_names_step() {
    let engine = ResearchEngine::new(
        steps(
            &["a", "b"],
            Arc::new(FailingSearcher),
            Arc::new(CountingSummarizer),
            Arc::new(ScriptedCritic::new(vec![])),
        ),
        ResearchConfig::default(),
    );

    let err = engine.run("topic", 3).await.unwrap_err();
    assert_eq!(err.failed_step(), Some(PipelineStep::Search));
    assert!(matches!(err, DelveError::PipelineFailure { .. }));
    assert!(err.to_string().contains("connection reset"));
}

#[tokio::test]
async fn test_summarizer_failure_names_step() {
    let provider = MockLlmProvider::new();
    provider.queue_error(LlmError::Timeout { timeout_secs: 5 });
    let brain = Arc::new(Brain::new(Arc::new(provider)));
    let engine = ResearchEngine::new(
        steps(
            &["a"],
            Arc::new(CountingSearcher::default()),
            Arc::new(delve_core::research::LlmSummarizer::new(brain, None)),
            Arc::new(ScriptedCritic::new(vec![])),
        ),
        ResearchConfig::default(),
    );

    let err = engine.run("topic", 1).await.unwrap_err();
    assert_eq!(err.failed_step(), Some(PipelineStep::Summarize));
}

#[tokio::test]
async fn test_repeated_runs_are_identical() {
    let engine = ResearchEngine::new(
        steps(
            &["x", "y", "z"],
            Arc::new(CountingSearcher::default()),
            Arc::new(CountingSummarizer),
            Arc::new(ScriptedCritic::new(vec![])),
        ),
        ResearchConfig::default(),
    );

    let first = engine.run("topic", 2).await.unwrap();
    let second = engine.run("topic", 2).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_sequential_and_concurrent_preserve_order() {
    let build = |concurrent_queries| {
        ResearchEngine::new(
            steps(
                &["one", "two", "three", "four"],
                Arc::new(CountingSearcher::default()),
                Arc::new(CountingSummarizer),
                Arc::new(ScriptedCritic::new(vec![])),
            ),
            ResearchConfig {
                concurrent_queries,
                ..ResearchConfig::default()
            },
        )
    };

    let concurrent = build(true).run("topic", 2).await.unwrap();
    let sequential = build(false).run("topic", 2).await.unwrap();
    assert_eq!(concurrent.search_results, sequential.search_results);
    assert_eq!(concurrent.search_results[2].title, "two #1");
}

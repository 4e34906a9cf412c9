//! # Delve Core
//!
//! Core library for the Delve research pipeline.
//! Provides the generation and search collaborators, the research workflow
//! controller with its refinement loop, layered configuration, and the
//! HTTP gateway that exposes a research run as a JSON endpoint.

pub mod brain;
pub mod config;
pub mod error;
pub mod gateway;
pub mod providers;
pub mod research;
pub mod search;
pub mod types;

// Re-export commonly used types at the crate root.
pub use brain::{Brain, LlmProvider, MockLlmProvider};
pub use config::{DelveConfig, load_config};
pub use error::{CollaboratorError, DelveError, Result, StepError};
pub use research::{PipelineStep, ResearchEngine, ResearchReport};
pub use search::SearchProvider;
pub use types::{CompletionRequest, CompletionResponse, Message, Role, SearchResult, TokenUsage};

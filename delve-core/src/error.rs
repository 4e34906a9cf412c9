//! Error types for the Delve core library.
//!
//! Uses `thiserror` for public API error types. Collaborator failures
//! (generation, search) are wrapped into step errors, and step errors that a
//! step cannot absorb surface as a `PipelineFailure` naming the failing step.

use crate::research::PipelineStep;
use std::path::PathBuf;

/// Top-level error type for the Delve core library.
#[derive(Debug, thiserror::Error)]
pub enum DelveError {
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Pipeline failed during {step}: {source}")]
    PipelineFailure {
        step: PipelineStep,
        #[source]
        source: StepError,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to initialize collaborator: {0}")]
    Setup(#[from] CollaboratorError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DelveError {
    /// Create an invalid-input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Attach the originating step to a step error.
    pub fn pipeline(step: PipelineStep, source: StepError) -> Self {
        Self::PipelineFailure { step, source }
    }

    /// The step that failed, if this is a pipeline failure.
    pub fn failed_step(&self) -> Option<PipelineStep> {
        match self {
            Self::PipelineFailure { step, .. } => Some(*step),
            _ => None,
        }
    }
}

/// Errors raised by a single pipeline step.
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("Collaborator error: {0}")]
    Collaborator(#[from] CollaboratorError),

    #[error("Parse error: {message}")]
    Parse { message: String },
}

impl StepError {
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }
}

impl From<LlmError> for StepError {
    fn from(err: LlmError) -> Self {
        Self::Collaborator(CollaboratorError::Generation(err))
    }
}

impl From<SearchError> for StepError {
    fn from(err: SearchError) -> Self {
        Self::Collaborator(CollaboratorError::Search(err))
    }
}

/// A failure reported by one of the external collaborators.
#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    #[error("Generation failed: {0}")]
    Generation(#[from] LlmError),

    #[error("Search failed: {0}")]
    Search(#[from] SearchError),
}

/// Errors from LLM provider interactions.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("API request failed: {message}")]
    ApiRequest { message: String },

    #[error("API response parse error: {message}")]
    ResponseParse { message: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Provider connection failed: {message}")]
    Connection { message: String },

    #[error("Unsupported LLM provider: {provider}")]
    UnsupportedProvider { provider: String },
}

/// Errors from web-search provider interactions.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Search request failed: {message}")]
    Request { message: String },

    #[error("Search response parse error: {message}")]
    ResponseParse { message: String },

    #[error("Authentication failed for search provider {provider}")]
    AuthFailed { provider: String },

    #[error("Unsupported search provider: {provider}")]
    UnsupportedProvider { provider: String },
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Configuration parse error: {message}")]
    ParseError { message: String },
}

/// A type alias for results using the top-level `DelveError`.
pub type Result<T> = std::result::Result<T, DelveError>;

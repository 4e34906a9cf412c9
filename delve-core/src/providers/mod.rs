//! LLM provider implementations.
//!
//! Provides concrete implementations of the `LlmProvider` trait for:
//! - Google Gemini API (Gemini models)
//! - OpenAI-compatible APIs (OpenAI, Azure, Ollama, vLLM, LM Studio)
//!
//! Use `create_provider()` to instantiate the appropriate provider based on config.

pub mod gemini;
pub mod openai_compat;

use crate::brain::LlmProvider;
use crate::config::LlmConfig;
use crate::error::LlmError;
use std::sync::Arc;

pub use gemini::GeminiProvider;
pub use openai_compat::OpenAiCompatibleProvider;

/// Create an LLM provider based on the configuration.
///
/// Routes to the appropriate provider implementation:
/// - `"gemini"` → `GeminiProvider`
/// - `"openai"`, `"ollama"`, `"local"`, `"openai-compatible"` → `OpenAiCompatibleProvider`
///
/// Credentials are resolved here, so a missing key is reported when the
/// provider is built rather than on the first request.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    match config.provider.as_str() {
        "gemini" => Ok(Arc::new(GeminiProvider::new(config)?)),
        "openai" | "ollama" | "local" | "openai-compatible" => {
            Ok(Arc::new(OpenAiCompatibleProvider::new(config)?))
        }
        other => Err(LlmError::UnsupportedProvider {
            provider: other.to_string(),
        }),
    }
}

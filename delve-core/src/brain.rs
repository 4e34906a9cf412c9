//! Brain module: generation collaborator.
//!
//! Defines the `LlmProvider` trait for model-agnostic text generation and the
//! `Brain` wrapper that turns a prompt into a single completion, which is the
//! only shape of model interaction the research pipeline needs.

use crate::error::LlmError;
use crate::types::{CompletionRequest, CompletionResponse, Message, TokenUsage};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Trait for generation providers.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Perform a full completion and return the response.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Return the default model name.
    fn model_name(&self) -> &str;
}

/// Prompt-in, text-out access to a generation provider.
///
/// Holds sampling parameters from configuration and logs the token usage of
/// each call. Shared between pipeline steps behind an `Arc`.
pub struct Brain {
    provider: Arc<dyn LlmProvider>,
    temperature: f32,
    max_tokens: Option<usize>,
}

impl Brain {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            temperature: 0.7,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Send `prompt` as a single user message and return the reply text.
    ///
    /// `model` overrides the provider's default model for this call.
    pub async fn generate(&self, prompt: &str, model: Option<&str>) -> Result<String, LlmError> {
        let request = CompletionRequest {
            messages: vec![Message::user(prompt)],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            model: model.map(str::to_string),
        };

        debug!(
            model = model.unwrap_or(self.provider.model_name()),
            prompt_chars = prompt.len(),
            "Sending completion request"
        );

        let response = self.provider.complete(request).await?;

        debug!(
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "Completion received"
        );

        Ok(response.message.content)
    }
}

type MockHandler = dyn Fn(&str) -> Result<String, LlmError> + Send + Sync;

/// A mock generation provider for testing and development.
///
/// Replies come from the queue first, then from the handler if one is set,
/// then a fixed default text. Every prompt and requested model is recorded.
pub struct MockLlmProvider {
    model: String,
    responses: Mutex<VecDeque<Result<CompletionResponse, LlmError>>>,
    handler: Option<Box<MockHandler>>,
    prompts: Mutex<Vec<String>>,
    models: Mutex<Vec<Option<String>>>,
}

impl MockLlmProvider {
    pub fn new() -> Self {
        Self {
            model: "mock-model".to_string(),
            responses: Mutex::new(VecDeque::new()),
            handler: None,
            prompts: Mutex::new(Vec::new()),
            models: Mutex::new(Vec::new()),
        }
    }

    /// Create a MockLlmProvider that always returns the given text.
    pub fn with_response(text: &str) -> Self {
        let reply = text.to_string();
        Self::with_handler(move |_| Ok(reply.clone()))
    }

    /// Create a MockLlmProvider that answers each prompt with `handler`.
    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&str) -> Result<String, LlmError> + Send + Sync + 'static,
    {
        Self {
            handler: Some(Box::new(handler)),
            ..Self::new()
        }
    }

    /// Queue a text reply for the next `complete` call.
    pub fn queue_text(&self, text: &str) {
        lock(&self.responses).push_back(Ok(Self::text_response(text)));
    }

    /// Queue an error for the next `complete` call.
    pub fn queue_error(&self, error: LlmError) {
        lock(&self.responses).push_back(Err(error));
    }

    /// Create a simple text response for testing.
    pub fn text_response(text: &str) -> CompletionResponse {
        CompletionResponse {
            message: Message::assistant(text),
            usage: TokenUsage {
                input_tokens: 100,
                output_tokens: 50,
            },
            model: "mock-model".to_string(),
            finish_reason: Some("stop".to_string()),
        }
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }

    /// Model overrides received so far, in call order.
    pub fn requested_models(&self) -> Vec<Option<String>> {
        lock(&self.models).clone()
    }
}

impl Default for MockLlmProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let prompt = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        lock(&self.prompts).push(prompt.clone());
        lock(&self.models).push(request.model);

        if let Some(queued) = lock(&self.responses).pop_front() {
            return queued;
        }
        match &self.handler {
            Some(handler) => handler(&prompt).map(|text| Self::text_response(&text)),
            None => Ok(Self::text_response(
                "I'm a mock LLM. No queued responses available.",
            )),
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_generate_returns_text() {
        let provider = Arc::new(MockLlmProvider::with_response("hello"));
        let brain = Brain::new(provider.clone());

        let text = brain.generate("say hello", None).await.unwrap();
        assert_eq!(text, "hello");
        assert_eq!(provider.prompts(), vec!["say hello".to_string()]);
        assert_eq!(provider.requested_models(), vec![None]);
    }

    #[tokio::test]
    async fn test_generate_passes_model_override() {
        let provider = Arc::new(MockLlmProvider::new());
        provider.queue_text("ok");
        let brain = Brain::new(provider.clone());

        brain
            .generate("prompt", Some("gemini-1.5-flash"))
            .await
            .unwrap();
        assert_eq!(
            provider.requested_models(),
            vec![Some("gemini-1.5-flash".to_string())]
        );
    }

    #[tokio::test]
    async fn test_generate_propagates_errors() {
        let provider = Arc::new(MockLlmProvider::new());
        provider.queue_error(LlmError::Timeout { timeout_secs: 5 });
        let brain = Brain::new(provider);

        let err = brain.generate("prompt", None).await.unwrap_err();
        assert!(matches!(err, LlmError::Timeout { timeout_secs: 5 }));
    }

    #[tokio::test]
    async fn test_mock_queue_precedes_handler() {
        let provider = MockLlmProvider::with_handler(|prompt| Ok(format!("echo: {prompt}")));
        provider.queue_text("queued");

        let first = provider.complete(request("one")).await.unwrap();
        let second = provider.complete(request("two")).await.unwrap();
        assert_eq!(first.message.content, "queued");
        assert_eq!(second.message.content, "echo: two");
    }

    #[tokio::test]
    async fn test_mock_default_reply() {
        let provider = MockLlmProvider::new();
        let response = provider.complete(request("anything")).await.unwrap();
        assert!(response.message.content.contains("mock LLM"));
        assert_eq!(provider.model_name(), "mock-model");
    }

    fn request(prompt: &str) -> CompletionRequest {
        CompletionRequest {
            messages: vec![Message::user(prompt)],
            ..Default::default()
        }
    }
}

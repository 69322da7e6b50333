//! BoxLanguageModel -- object-safe dynamic dispatch wrapper for LanguageModel.
//!
//! 1. Define an object-safe `LanguageModelDyn` trait with boxed futures
//! 2. Blanket-impl `LanguageModelDyn` for all `T: LanguageModel`
//! 3. `BoxLanguageModel` wraps `Box<dyn LanguageModelDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use futures_util::Stream;

use convoy_types::llm::{LlmError, ToolSpec, ToolUseResponse};
use convoy_types::message::Message;

use super::service::LanguageModel;

/// Object-safe version of [`LanguageModel`] with boxed futures.
///
/// Exists solely to enable dynamic dispatch; a blanket implementation covers
/// every `LanguageModel`.
pub trait LanguageModelDyn: Send + Sync {
    fn name(&self) -> &str;

    fn execute_boxed<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, LlmError>> + Send + 'a>>;

    fn execute_with_history_boxed<'a>(
        &'a self,
        messages: &'a [Message],
    ) -> Pin<Box<dyn Future<Output = Result<String, LlmError>> + Send + 'a>>;

    fn execute_stream_boxed(
        &self,
        prompt: &str,
    ) -> Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send + 'static>>;

    fn execute_with_tools_boxed<'a>(
        &'a self,
        prompt: &'a str,
        history: &'a [Message],
        tools: &'a [ToolSpec],
    ) -> Pin<Box<dyn Future<Output = Result<ToolUseResponse, LlmError>> + Send + 'a>>;

    fn execute_structured_boxed<'a>(
        &'a self,
        prompt: &'a str,
        schema: &'a serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = Result<serde_json::Value, LlmError>> + Send + 'a>>;

    fn is_available_boxed(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>>;
}

impl<T: LanguageModel> LanguageModelDyn for T {
    fn name(&self) -> &str {
        LanguageModel::name(self)
    }

    fn execute_boxed<'a>(
        &'a self,
        prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, LlmError>> + Send + 'a>> {
        Box::pin(self.execute(prompt))
    }

    fn execute_with_history_boxed<'a>(
        &'a self,
        messages: &'a [Message],
    ) -> Pin<Box<dyn Future<Output = Result<String, LlmError>> + Send + 'a>> {
        Box::pin(self.execute_with_history(messages))
    }

    fn execute_stream_boxed(
        &self,
        prompt: &str,
    ) -> Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send + 'static>> {
        self.execute_stream(prompt)
    }

    fn execute_with_tools_boxed<'a>(
        &'a self,
        prompt: &'a str,
        history: &'a [Message],
        tools: &'a [ToolSpec],
    ) -> Pin<Box<dyn Future<Output = Result<ToolUseResponse, LlmError>> + Send + 'a>> {
        Box::pin(self.execute_with_tools(prompt, history, tools))
    }

    fn execute_structured_boxed<'a>(
        &'a self,
        prompt: &'a str,
        schema: &'a serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = Result<serde_json::Value, LlmError>> + Send + 'a>> {
        Box::pin(self.execute_structured(prompt, schema))
    }

    fn is_available_boxed(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        Box::pin(self.is_available())
    }
}

/// Type-erased language model for runtime backend selection.
///
/// Since `LanguageModel` uses RPITIT it cannot be a trait object directly;
/// `BoxLanguageModel` provides equivalent methods delegating to the inner
/// `LanguageModelDyn`.
pub struct BoxLanguageModel {
    inner: Box<dyn LanguageModelDyn + Send + Sync>,
}

impl BoxLanguageModel {
    /// Wrap a concrete `LanguageModel` in a type-erased box.
    pub fn new<T: LanguageModel + 'static>(model: T) -> Self {
        Self {
            inner: Box::new(model),
        }
    }

    /// Human-readable backend name.
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Execute a plain prompt and return the full response text.
    pub async fn execute(&self, prompt: &str) -> Result<String, LlmError> {
        self.inner.execute_boxed(prompt).await
    }

    /// Execute against an explicit message history.
    pub async fn execute_with_history(&self, messages: &[Message]) -> Result<String, LlmError> {
        self.inner.execute_with_history_boxed(messages).await
    }

    /// Execute a prompt and stream response chunks.
    pub fn execute_stream(
        &self,
        prompt: &str,
    ) -> Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send + 'static>> {
        self.inner.execute_stream_boxed(prompt)
    }

    /// Execute with tool specs advertised.
    pub async fn execute_with_tools(
        &self,
        prompt: &str,
        history: &[Message],
        tools: &[ToolSpec],
    ) -> Result<ToolUseResponse, LlmError> {
        self.inner
            .execute_with_tools_boxed(prompt, history, tools)
            .await
    }

    /// Execute a prompt constrained to a JSON schema.
    pub async fn execute_structured(
        &self,
        prompt: &str,
        schema: &serde_json::Value,
    ) -> Result<serde_json::Value, LlmError> {
        self.inner.execute_structured_boxed(prompt, schema).await
    }

    /// Whether the backend is currently reachable.
    pub async fn is_available(&self) -> bool {
        self.inner.is_available_boxed().await
    }
}

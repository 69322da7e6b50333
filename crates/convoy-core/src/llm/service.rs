//! LanguageModel trait definition.
//!
//! The abstraction every model backend implements. Uses RPITIT for the
//! request/response methods and `Pin<Box<dyn Stream>>` for streaming
//! (streams need to be object-safe for the BoxLanguageModel wrapper).

use std::pin::Pin;

use futures_util::Stream;

use convoy_types::llm::{LlmError, ToolSpec, ToolUseResponse};
use convoy_types::message::Message;

/// Trait for language-model backends.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition). The
/// `execute_stream` method returns a boxed stream because streams need to be
/// object-safe for [`super::BoxLanguageModel`].
pub trait LanguageModel: Send + Sync {
    /// Human-readable backend name (e.g. "anthropic", "stub").
    fn name(&self) -> &str;

    /// Execute a plain prompt and return the full response text.
    fn execute(
        &self,
        prompt: &str,
    ) -> impl std::future::Future<Output = Result<String, LlmError>> + Send;

    /// Execute against an explicit message history.
    fn execute_with_history(
        &self,
        messages: &[Message],
    ) -> impl std::future::Future<Output = Result<String, LlmError>> + Send;

    /// Execute a prompt and stream response chunks.
    fn execute_stream(
        &self,
        prompt: &str,
    ) -> Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send + 'static>>;

    /// Execute with tool specs advertised; the response may request calls.
    fn execute_with_tools(
        &self,
        prompt: &str,
        history: &[Message],
        tools: &[ToolSpec],
    ) -> impl std::future::Future<Output = Result<ToolUseResponse, LlmError>> + Send;

    /// Execute a prompt constrained to a JSON schema and parse the output.
    fn execute_structured(
        &self,
        prompt: &str,
        schema: &serde_json::Value,
    ) -> impl std::future::Future<Output = Result<serde_json::Value, LlmError>> + Send;

    /// Whether the backend is currently reachable.
    fn is_available(&self) -> impl std::future::Future<Output = bool> + Send;
}

//! Language-model interface types.
//!
//! Data shapes for the model backend the runtime consumes: tool call
//! requests/specs, finish reasons, and the typed failure set. The concrete
//! provider adapters live outside this core.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural end of turn.
    Stop,
    /// The model requested tool calls.
    ToolCalls,
    /// Output token limit reached.
    Length,
    /// Content was filtered by the provider.
    ContentFilter,
    /// Provider-side error reported in-band.
    Error,
}

impl fmt::Display for FinishReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FinishReason::Stop => write!(f, "stop"),
            FinishReason::ToolCalls => write!(f, "tool_calls"),
            FinishReason::Length => write!(f, "length"),
            FinishReason::ContentFilter => write!(f, "content_filter"),
            FinishReason::Error => write!(f, "error"),
        }
    }
}

impl FromStr for FinishReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stop" => Ok(FinishReason::Stop),
            "tool_calls" => Ok(FinishReason::ToolCalls),
            "length" => Ok(FinishReason::Length),
            "content_filter" => Ok(FinishReason::ContentFilter),
            "error" => Ok(FinishReason::Error),
            other => Err(format!("invalid finish reason: '{other}'")),
        }
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned call id, echoed back on the result message.
    pub id: String,
    /// Name of the tool to invoke.
    pub name: String,
    /// JSON arguments for the tool.
    pub arguments: serde_json::Value,
}

/// Advertisement of a tool to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON schema for the tool's arguments.
    pub parameters: serde_json::Value,
}

/// Response from a tool-enabled model call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolUseResponse {
    /// Assistant text content (may be empty when only tools are requested).
    pub content: String,
    /// Tool calls the model wants executed, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Why generation stopped.
    pub finish_reason: FinishReason,
}

/// Typed failures from language-model operations.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("provider error: {0}")]
    Provider(String),

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("request timed out after {0}ms")]
    Timeout(u64),

    #[error("failed to parse model output: {0}")]
    Parse(String),

    #[error("rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("tool '{tool}' failed: {message}")]
    Tool { tool: String, message: String },
}

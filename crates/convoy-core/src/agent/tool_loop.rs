//! Tool-calling conversation loop.
//!
//! Drives a model/tool round-trip against a conversation thread: the model
//! is called with the thread history and the registry's tool specs; while it
//! keeps requesting tool calls, each call is executed and its result appended
//! as a Tool message, then the model is called again. The loop is bounded by
//! `max_iterations`.

use std::sync::Arc;

use convoy_types::llm::{FinishReason, LlmError, ToolCall};
use convoy_types::message::{ConversationMessage, Message, Role};
use convoy_types::thread::{ConversationThread, ThreadState};
use tracing::{debug, info, warn};

use crate::context::counter::{HeuristicCounter, TokenCounter};
use crate::llm::BoxLanguageModel;
use crate::tool::ToolRegistry;

/// Failures from the tool-calling loop.
#[derive(Debug, thiserror::Error)]
pub enum ToolLoopError {
    /// The model was still requesting tools after the iteration budget.
    #[error("tool loop did not converge within {limit} iterations")]
    IterationLimit { limit: usize },

    /// A requested tool is missing or failed to execute.
    #[error("tool '{tool}' failed: {message}")]
    ToolFailed { tool: String, message: String },

    /// The underlying model call failed.
    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// Bounded model/tool round-trip over a conversation thread.
pub struct ToolConversationLoop {
    model: BoxLanguageModel,
    tools: Arc<ToolRegistry>,
    max_iterations: usize,
    counter: HeuristicCounter,
}

impl ToolConversationLoop {
    /// Default iteration budget.
    pub const DEFAULT_MAX_ITERATIONS: usize = 10;

    pub fn new(model: BoxLanguageModel, tools: Arc<ToolRegistry>) -> Self {
        Self {
            model,
            tools,
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
            counter: HeuristicCounter::default(),
        }
    }

    /// Override the iteration budget.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Run the loop for one user prompt, mutating `thread` along the way.
    ///
    /// Appends the prompt as a User message, then alternates model calls and
    /// tool executions until the model stops requesting tools. On success the
    /// thread ends `Completed` and the final assistant text is returned. Any
    /// error exit (model failure, tool failure, iteration-budget exhaustion)
    /// leaves the thread `Failed`, never stranded mid-state.
    pub async fn run(
        &self,
        thread: &mut ConversationThread,
        prompt: &str,
    ) -> Result<String, ToolLoopError> {
        let specs = self.tools.specs();
        self.push(thread, Message::new(Role::User, prompt));
        thread.set_state(ThreadState::InProgress);

        for iteration in 1..=self.max_iterations {
            let history: Vec<Message> =
                thread.messages.iter().map(|m| m.message.clone()).collect();
            let response = match self.model.execute_with_tools(prompt, &history, &specs).await {
                Ok(response) => response,
                Err(e) => {
                    thread.set_state(ThreadState::Failed);
                    return Err(e.into());
                }
            };

            debug!(
                iteration,
                finish_reason = %response.finish_reason,
                tool_calls = response.tool_calls.len(),
                "model turn"
            );

            if response.finish_reason != FinishReason::ToolCalls {
                self.push(thread, Message::new(Role::Assistant, &response.content));
                thread.set_state(ThreadState::Completed);
                info!(iteration, "tool loop converged");
                return Ok(response.content);
            }

            self.push(thread, Message::new(Role::Assistant, &response.content));
            thread.set_state(ThreadState::WaitingForTool);

            for call in &response.tool_calls {
                let output = match self.invoke(call).await {
                    Ok(output) => output,
                    Err(e) => {
                        thread.set_state(ThreadState::Failed);
                        return Err(e);
                    }
                };
                self.push(
                    thread,
                    Message::tool_result(&call.id, &call.name, output.to_string()),
                );
            }
            thread.set_state(ThreadState::InProgress);
        }

        warn!(limit = self.max_iterations, "tool loop exhausted");
        thread.set_state(ThreadState::Failed);
        Err(ToolLoopError::IterationLimit {
            limit: self.max_iterations,
        })
    }

    async fn invoke(&self, call: &ToolCall) -> Result<serde_json::Value, ToolLoopError> {
        let tool = self
            .tools
            .get(&call.name)
            .ok_or_else(|| ToolLoopError::ToolFailed {
                tool: call.name.clone(),
                message: "not registered".to_string(),
            })?;
        tool.execute_boxed(call.arguments.clone())
            .await
            .map_err(|e| ToolLoopError::ToolFailed {
                tool: call.name.clone(),
                message: e.to_string(),
            })
    }

    fn push(&self, thread: &mut ConversationThread, message: Message) {
        let tokens = self.counter.count_message(&message);
        thread.push_message(ConversationMessage::new(message, tokens));
    }
}

impl std::fmt::Debug for ToolConversationLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolConversationLoop")
            .field("model", &self.model.name())
            .field("tools", &self.tools.len())
            .field("max_iterations", &self.max_iterations)
            .finish()
    }
}

//! Agent trait and its object-safe box wrapper.
//!
//! 1. Define an object-safe `AgentDyn` trait with a boxed future
//! 2. Blanket-impl `AgentDyn` for all `T: Agent`
//! 3. `BoxAgent` wraps `Box<dyn AgentDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use convoy_types::agent::{AgentContext, AgentMetadata, AgentResult};
use convoy_types::error::AgentError;

/// A named unit exposing capabilities and an execute operation.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait Agent: Send + Sync {
    /// Routing-facing description of this agent.
    fn metadata(&self) -> &AgentMetadata;

    /// Handle one input against a bounded context.
    fn execute(
        &self,
        input: &str,
        context: &AgentContext,
    ) -> impl Future<Output = Result<AgentResult, AgentError>> + Send;
}

/// Object-safe version of [`Agent`] with a boxed future.
pub trait AgentDyn: Send + Sync {
    fn metadata(&self) -> &AgentMetadata;

    fn execute_boxed<'a>(
        &'a self,
        input: &'a str,
        context: &'a AgentContext,
    ) -> Pin<Box<dyn Future<Output = Result<AgentResult, AgentError>> + Send + 'a>>;
}

impl<T: Agent> AgentDyn for T {
    fn metadata(&self) -> &AgentMetadata {
        Agent::metadata(self)
    }

    fn execute_boxed<'a>(
        &'a self,
        input: &'a str,
        context: &'a AgentContext,
    ) -> Pin<Box<dyn Future<Output = Result<AgentResult, AgentError>> + Send + 'a>> {
        Box::pin(self.execute(input, context))
    }
}

/// Type-erased agent for registry storage and routing.
pub struct BoxAgent {
    inner: Box<dyn AgentDyn + Send + Sync>,
}

impl BoxAgent {
    /// Wrap a concrete `Agent` in a type-erased box.
    pub fn new<T: Agent + 'static>(agent: T) -> Self {
        Self {
            inner: Box::new(agent),
        }
    }

    /// Routing-facing description of this agent.
    pub fn metadata(&self) -> &AgentMetadata {
        self.inner.metadata()
    }

    /// Agent name shorthand.
    pub fn name(&self) -> &str {
        &self.inner.metadata().name
    }

    /// Handle one input against a bounded context.
    pub async fn execute(
        &self,
        input: &str,
        context: &AgentContext,
    ) -> Result<AgentResult, AgentError> {
        self.inner.execute_boxed(input, context).await
    }
}

impl std::fmt::Debug for BoxAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxAgent")
            .field("name", &self.name())
            .field("capabilities", &self.metadata().capabilities)
            .finish()
    }
}

//! Agent runtime: capability routing, bounded handoff chains, parallel
//! fan-out, and the multi-turn tool-calling loop.

pub mod box_agent;
pub mod router;
pub mod runtime;
pub mod tool_loop;

pub use box_agent::{Agent, BoxAgent};
pub use router::{RoutingStrategy, route};
pub use runtime::{AgentRuntime, HandoffHop, HandoffOutcome, default_aggregate};
pub use tool_loop::{ToolConversationLoop, ToolLoopError};

//! Core runtime for Convoy: cooperating AI agents over shared conversation
//! state.
//!
//! Five components, bottom-up: the context window manager ([`context`]),
//! conversation memory ([`memory`]), the prompt registry ([`prompt`]), and
//! the agent runtime ([`agent`]) with its tool-calling loop. The [`llm`] and
//! [`tool`] modules define the ports this core consumes -- a language-model
//! service and a tool registry -- without implementing any provider.
//!
//! All shared state lives in explicitly constructed service instances backed
//! by concurrent maps; there is no ambient global state.

pub mod agent;
pub mod context;
pub mod llm;
pub mod memory;
pub mod prompt;
pub mod tool;

//! Shared domain types for Convoy.
//!
//! This crate contains the conversation data model (messages, threads,
//! checkpoints), prompt templates, agent metadata/context/result types, and
//! the discriminated error enums used across the runtime.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod agent;
pub mod error;
pub mod llm;
pub mod message;
pub mod prompt;
pub mod thread;

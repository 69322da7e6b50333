//! Context window management.
//!
//! Trims a message sequence to token/message budgets under a chosen strategy
//! before it is sent to a model call.

pub mod counter;
pub mod window;

pub use counter::{HeuristicCounter, TokenCounter};
pub use window::{TrimStrategy, WindowLimits, WindowOutcome, apply_window};

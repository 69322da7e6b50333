//! Language-model service port.
//!
//! The runtime consumes a [`LanguageModel`] but never implements one;
//! concrete provider adapters live in the host application.

pub mod box_model;
pub mod service;

pub use box_model::BoxLanguageModel;
pub use service::LanguageModel;

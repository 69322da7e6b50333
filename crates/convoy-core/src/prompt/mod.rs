//! Versioned prompt templates: registration, resolution, rendering,
//! composition, rollback, and deterministic variant assignment.

pub mod registry;
pub mod variant;

pub use registry::PromptRegistry;
pub use variant::choose_variant;

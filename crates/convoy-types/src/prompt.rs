//! Versioned prompt template types.
//!
//! A `PromptTemplate` is a named, integer-versioned body with `{{var}}`
//! placeholders. Names are non-unique keys; (name, version) pairs are unique
//! within a registry. `TemplateRef` addresses a template by name with an
//! optional pinned version.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A versioned prompt template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptTemplate {
    /// Template name (non-unique; versions share a name).
    pub name: String,
    /// Integer version, unique per name.
    pub version: u32,
    /// Body text with `{{var}}` placeholders.
    pub body: String,
    /// Optional human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Category tags for filtering.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// When the template was created.
    pub created_at: DateTime<Utc>,
    /// Whether this version is the active one for unpinned resolution.
    pub active: bool,
}

impl PromptTemplate {
    /// Build a template with the given name, version, and body.
    ///
    /// New templates start active; registration and rollback manage the
    /// single-active-version discipline.
    pub fn new(name: impl Into<String>, version: u32, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version,
            body: body.into(),
            description: None,
            tags: Vec::new(),
            created_at: Utc::now(),
            active: true,
        }
    }

    /// Attach a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attach tags.
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

/// A reference to a template: by name, optionally pinned to a version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
}

impl TemplateRef {
    /// Reference the active (or highest) version of a named template.
    pub fn latest(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
        }
    }

    /// Reference an exact (name, version) pair.
    pub fn pinned(name: impl Into<String>, version: u32) -> Self {
        Self {
            name: name.into(),
            version: Some(version),
        }
    }
}

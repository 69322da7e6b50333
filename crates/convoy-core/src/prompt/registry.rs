//! Prompt registry service.
//!
//! Holds versioned named templates in a concurrent map (name -> versions,
//! ascending). Resolution follows: pinned version exactly, else the highest
//! active version, else the highest version overall. Rendering is literal
//! `{{var}}` substitution; unresolved placeholders stay intact.

use std::collections::BTreeMap;

use dashmap::DashMap;
use tracing::debug;

use convoy_types::error::PromptError;
use convoy_types::prompt::{PromptTemplate, TemplateRef};

/// Versioned named prompt templates with active-version selection.
#[derive(Debug, Default)]
pub struct PromptRegistry {
    /// name -> versions, kept sorted ascending by version.
    templates: DashMap<String, Vec<PromptTemplate>>,
}

impl PromptRegistry {
    pub fn new() -> Self {
        Self {
            templates: DashMap::new(),
        }
    }

    /// Register a template version.
    ///
    /// Fails with `InvalidName` on a blank name and `DuplicateTemplate` when
    /// the (name, version) pair already exists.
    pub fn register(&self, template: PromptTemplate) -> Result<(), PromptError> {
        if template.name.trim().is_empty() {
            return Err(PromptError::InvalidName(
                "template name must not be blank".to_string(),
            ));
        }

        let mut versions = self
            .templates
            .entry(template.name.clone())
            .or_default();
        if versions.iter().any(|t| t.version == template.version) {
            return Err(PromptError::DuplicateTemplate {
                name: template.name,
                version: template.version,
            });
        }

        debug!(name = %template.name, version = template.version, "registered prompt template");
        versions.push(template);
        versions.sort_by_key(|t| t.version);
        Ok(())
    }

    /// Resolve a reference to a concrete template.
    ///
    /// A pinned version must match exactly. Unpinned references resolve to
    /// the highest-version template flagged active, falling back to the
    /// highest version overall.
    pub fn resolve(&self, reference: &TemplateRef) -> Result<PromptTemplate, PromptError> {
        let versions = self
            .templates
            .get(&reference.name)
            .ok_or_else(|| PromptError::TemplateNotFound(reference.name.clone()))?;

        match reference.version {
            Some(version) => versions
                .iter()
                .find(|t| t.version == version)
                .cloned()
                .ok_or(PromptError::VersionNotFound {
                    name: reference.name.clone(),
                    version,
                }),
            None => versions
                .iter()
                .rev()
                .find(|t| t.active)
                .or_else(|| versions.last())
                .cloned()
                .ok_or_else(|| PromptError::TemplateNotFound(reference.name.clone())),
        }
    }

    /// Resolve and render a template with literal `{{var}}` substitution.
    ///
    /// Placeholders without a matching variable are left intact.
    pub fn render(
        &self,
        reference: &TemplateRef,
        vars: &BTreeMap<String, String>,
    ) -> Result<String, PromptError> {
        let template = self.resolve(reference)?;
        Ok(substitute(&template.body, vars))
    }

    /// Render several references and join them with a blank line.
    pub fn compose(
        &self,
        references: &[TemplateRef],
        vars: &BTreeMap<String, String>,
    ) -> Result<String, PromptError> {
        let mut parts = Vec::with_capacity(references.len());
        for reference in references {
            parts.push(self.render(reference, vars)?);
        }
        Ok(parts.join("\n\n"))
    }

    /// Make `to_version` the single active version of `name`.
    ///
    /// Sets `active = true` only on the target version and false on all
    /// siblings. Fails on unknown name or version.
    pub fn rollback(&self, name: &str, to_version: u32) -> Result<(), PromptError> {
        let mut versions = self
            .templates
            .get_mut(name)
            .ok_or_else(|| PromptError::TemplateNotFound(name.to_string()))?;

        if !versions.iter().any(|t| t.version == to_version) {
            return Err(PromptError::VersionNotFound {
                name: name.to_string(),
                version: to_version,
            });
        }

        for t in versions.iter_mut() {
            t.active = t.version == to_version;
        }
        debug!(name, to_version, "rolled back active prompt version");
        Ok(())
    }

    /// All registered versions of a name, ascending.
    pub fn versions(&self, name: &str) -> Vec<u32> {
        self.templates
            .get(name)
            .map(|v| v.iter().map(|t| t.version).collect())
            .unwrap_or_default()
    }

    /// The version an unpinned reference would currently resolve to.
    pub fn active_version(&self, name: &str) -> Option<u32> {
        self.resolve(&TemplateRef::latest(name)).ok().map(|t| t.version)
    }
}

/// Literal `{{var}}` substitution. Unknown placeholders stay intact.
fn substitute(body: &str, vars: &BTreeMap<String, String>) -> String {
    let mut out = body.to_string();
    for (key, value) in vars {
        out = out.replace(&format!("{{{{{key}}}}}"), value);
    }
    out
}

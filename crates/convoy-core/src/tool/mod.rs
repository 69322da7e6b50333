//! Tool port and registry.
//!
//! A [`Tool`] maps an argument payload to a result payload. The
//! [`ToolRegistry`] is the name -> tool table the tool-calling loop consults;
//! `specs()` produces the advertisements sent to the model.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use dashmap::DashMap;

use convoy_types::llm::{LlmError, ToolSpec};

/// An executable capability exposed to the model.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait Tool: Send + Sync {
    /// Tool name, unique within a registry.
    fn name(&self) -> &str;

    /// Human-readable description shown to the model.
    fn description(&self) -> &str;

    /// JSON schema of the argument payload.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool against an argument payload.
    fn execute(
        &self,
        arguments: serde_json::Value,
    ) -> impl Future<Output = Result<serde_json::Value, LlmError>> + Send;
}

/// Object-safe version of [`Tool`] with a boxed future.
pub trait ToolDyn: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn parameters_schema(&self) -> serde_json::Value;

    fn execute_boxed(
        &self,
        arguments: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = Result<serde_json::Value, LlmError>> + Send + '_>>;
}

impl<T: Tool> ToolDyn for T {
    fn name(&self) -> &str {
        Tool::name(self)
    }

    fn description(&self) -> &str {
        Tool::description(self)
    }

    fn parameters_schema(&self) -> serde_json::Value {
        Tool::parameters_schema(self)
    }

    fn execute_boxed(
        &self,
        arguments: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = Result<serde_json::Value, LlmError>> + Send + '_>> {
        Box::pin(self.execute(arguments))
    }
}

/// Name -> tool table consulted by the tool-calling loop.
#[derive(Default)]
pub struct ToolRegistry {
    tools: DashMap<String, Arc<dyn ToolDyn>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: DashMap::new(),
        }
    }

    /// Register a tool under its own name, replacing any previous entry.
    pub fn register<T: Tool + 'static>(&self, tool: T) {
        self.tools.insert(tool.name().to_string(), Arc::new(tool));
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolDyn>> {
        self.tools.get(name).map(|t| Arc::clone(&t))
    }

    /// Advertisements for every registered tool, sorted by name.
    pub fn specs(&self) -> Vec<ToolSpec> {
        let mut specs: Vec<ToolSpec> = self
            .tools
            .iter()
            .map(|entry| ToolSpec {
                name: entry.name().to_string(),
                description: entry.description().to_string(),
                parameters: entry.parameters_schema(),
            })
            .collect();
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        specs
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Echo;

    impl Tool for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "returns its arguments unchanged"
        }

        fn parameters_schema(&self) -> serde_json::Value {
            json!({"type": "object"})
        }

        async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, LlmError> {
            Ok(arguments)
        }
    }

    #[tokio::test]
    async fn test_register_and_execute() {
        let registry = ToolRegistry::new();
        registry.register(Echo);

        let tool = registry.get("echo").unwrap();
        let out = tool.execute_boxed(json!({"x": 1})).await.unwrap();
        assert_eq!(out, json!({"x": 1}));
    }

    #[test]
    fn test_unknown_tool_is_none() {
        let registry = ToolRegistry::new();
        assert!(registry.get("ghost").is_none());
    }

    #[test]
    fn test_specs_sorted_by_name() {
        struct Named(&'static str);
        impl Tool for Named {
            fn name(&self) -> &str {
                self.0
            }
            fn description(&self) -> &str {
                "test"
            }
            fn parameters_schema(&self) -> serde_json::Value {
                json!({})
            }
            async fn execute(&self, _: serde_json::Value) -> Result<serde_json::Value, LlmError> {
                Ok(json!(null))
            }
        }

        let registry = ToolRegistry::new();
        registry.register(Named("zeta"));
        registry.register(Named("alpha"));

        let names: Vec<String> = registry.specs().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }
}

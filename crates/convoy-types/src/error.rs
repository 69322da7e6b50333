use thiserror::Error;
use uuid::Uuid;

/// Errors from conversation memory operations.
#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("thread {0} not found")]
    NotFound(Uuid),

    #[error("persistence failed: {0}")]
    PersistenceFailed(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Errors from prompt registry operations.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("template '{name}' version {version} is already registered")]
    DuplicateTemplate { name: String, version: u32 },

    #[error("template '{0}' not found")]
    TemplateNotFound(String),

    #[error("template '{name}' has no version {version}")]
    VersionNotFound { name: String, version: u32 },

    #[error("invalid template name: {0}")]
    InvalidName(String),

    #[error("experiment '{0}' has no variants to choose from")]
    EmptyVariantList(String),
}

/// Errors from agent routing and execution.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("agent '{agent}' failed: {message}")]
    Execution { agent: String, message: String },

    #[error("no agent exposes capability '{0}'")]
    NoAgentForCapability(String),

    #[error("agent '{0}' is not registered")]
    AgentNotFound(String),

    #[error("ambiguous routing for capability '{capability}': {}", contenders.join(", "))]
    RoutingConflict {
        capability: String,
        contenders: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_error_display() {
        let id = Uuid::now_v7();
        let err = MemoryError::NotFound(id);
        assert!(err.to_string().contains(&id.to_string()));
    }

    #[test]
    fn test_prompt_error_display() {
        let err = PromptError::DuplicateTemplate {
            name: "greeting".to_string(),
            version: 2,
        };
        assert_eq!(
            err.to_string(),
            "template 'greeting' version 2 is already registered"
        );
    }

    #[test]
    fn test_routing_conflict_lists_contenders() {
        let err = AgentError::RoutingConflict {
            capability: "search".to_string(),
            contenders: vec!["alpha".to_string(), "beta".to_string()],
        };
        let s = err.to_string();
        assert!(s.contains("search"));
        assert!(s.contains("alpha, beta"));
    }

    #[test]
    fn test_execution_error_names_agent() {
        let err = AgentError::Execution {
            agent: "triage".to_string(),
            message: "model unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "agent 'triage' failed: model unavailable");
    }
}

//! Agent metadata, per-call context, and result types.
//!
//! `AgentMetadata` describes what an agent can do for routing purposes.
//! `AgentContext` is the bounded view of conversation state an agent sees for
//! one call. `AgentResult` carries the agent's output plus an optional
//! handoff directive linking invocations into a depth-bounded chain.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::message::ConversationMessage;

/// Routing-facing description of an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentMetadata {
    /// Agent name, unique per routing call.
    pub name: String,
    /// Capability tags this agent exposes.
    pub capabilities: BTreeSet<String>,
    /// Semantic version string (e.g. "1.4.0").
    pub version: String,
    /// Human-readable description.
    pub description: String,
    /// Tie-break priority; higher wins.
    pub priority: i32,
}

impl AgentMetadata {
    /// Build metadata with the given name and capabilities.
    pub fn new<I, S>(name: impl Into<String>, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            capabilities: capabilities.into_iter().map(Into::into).collect(),
            version: "0.1.0".to_string(),
            description: String::new(),
            priority: 0,
        }
    }

    /// Set the semantic version string.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the routing priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Whether this agent exposes the given capability tag.
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.contains(capability)
    }
}

/// Bounds applied to a context before each agent call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ContextConstraints {
    /// Maximum number of history messages, if bounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_messages: Option<usize>,
    /// Maximum estimated token total, if bounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Tool names the agent may call, if restricted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_allowlist: Option<BTreeSet<String>>,
    /// Whether the allowlist is enforced (false = advisory).
    #[serde(default)]
    pub enforce_allowlist: bool,
}

/// The conversation state an agent sees for one call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentContext {
    /// Backing thread id.
    pub thread_id: Uuid,
    /// Parent thread id when this context was forked for a handoff.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_thread_id: Option<Uuid>,
    /// Per-call message history (already trimmed by the caller).
    pub history: Vec<ConversationMessage>,
    /// Tools available to this call.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub available_tools: Vec<String>,
    /// Bounds applied before each call.
    #[serde(default)]
    pub constraints: ContextConstraints,
    /// Arbitrary call-scoped state.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub state: BTreeMap<String, serde_json::Value>,
}

impl AgentContext {
    /// Build an empty context backed by the given thread.
    pub fn new(thread_id: Uuid) -> Self {
        Self {
            thread_id,
            parent_thread_id: None,
            history: Vec::new(),
            available_tools: Vec::new(),
            constraints: ContextConstraints::default(),
            state: BTreeMap::new(),
        }
    }

    /// Replace the history.
    pub fn with_history(mut self, history: Vec<ConversationMessage>) -> Self {
        self.history = history;
        self
    }

    /// Replace the constraints.
    pub fn with_constraints(mut self, constraints: ContextConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    /// Fork this context onto a new conversational branch.
    ///
    /// The fork carries the history and constraints forward and records the
    /// originating thread as parent. Used on handoff so each hop writes to
    /// its own branch.
    pub fn fork_for(&self, new_thread_id: Uuid) -> Self {
        Self {
            thread_id: new_thread_id,
            parent_thread_id: Some(self.thread_id),
            history: self.history.clone(),
            available_tools: self.available_tools.clone(),
            constraints: self.constraints.clone(),
            state: self.state.clone(),
        }
    }

    /// Store a state entry.
    pub fn set_state(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.state.insert(key.into(), value);
    }

    /// Read a state entry.
    pub fn get_state(&self, key: &str) -> Option<&serde_json::Value> {
        self.state.get(key)
    }

    /// Whether the given tool may be called under the current constraints.
    ///
    /// An unenforced or absent allowlist permits everything.
    pub fn tool_permitted(&self, tool: &str) -> bool {
        if !self.constraints.enforce_allowlist {
            return true;
        }
        match &self.constraints.tool_allowlist {
            Some(allow) => allow.contains(tool),
            None => true,
        }
    }
}

/// Directive in an agent result that routes execution to another agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Handoff {
    /// Name of the agent to hand off to.
    pub target: String,
    /// Why the handoff is happening.
    pub reason: String,
    /// Structured payload for the target agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

/// Output of one agent invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResult {
    /// Name of the agent that produced this result.
    pub agent: String,
    /// The agent's response content.
    pub content: String,
    /// Optional directive to continue with another agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handoff: Option<Handoff>,
    /// Entries to merge into the context state map.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub state_patch: BTreeMap<String, serde_json::Value>,
    /// Free-form result metadata.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl AgentResult {
    /// Build a terminal result with no handoff.
    pub fn new(agent: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            content: content.into(),
            handoff: None,
            state_patch: BTreeMap::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// Attach a handoff directive.
    pub fn with_handoff(mut self, handoff: Handoff) -> Self {
        self.handoff = Some(handoff);
        self
    }

    /// Attach a state patch entry.
    pub fn with_state(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.state_patch.insert(key.into(), value);
        self
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

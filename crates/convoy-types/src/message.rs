//! Conversation message types for Convoy.
//!
//! `Message` is the immutable wire-level payload (role + content + optional
//! tool identity). `ConversationMessage` wraps it with everything the runtime
//! tracks per message: id, timestamp, token count, cost, metadata, and the
//! `important` flag consumed by priority-based trimming.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Tool => write!(f, "tool"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "system" => Ok(Role::System),
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            "tool" => Ok(Role::Tool),
            other => Err(format!("invalid role: '{other}'")),
        }
    }
}

/// A single conversation message.
///
/// Immutable by convention: no mutators are exposed and the runtime treats
/// instances as values. Tool result messages carry the id and name of the
/// call they answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
}

impl Message {
    /// Build a plain message with no tool identity.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_call_id: None,
            tool_name: None,
        }
    }

    /// Build a tool-result message answering a specific tool call.
    pub fn tool_result(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_call_id: Some(tool_call_id.into()),
            tool_name: Some(tool_name.into()),
        }
    }
}

/// A message as tracked inside a conversation thread.
///
/// Owned by exactly one thread. The `important` flag defaults to `true` for
/// System and Tool roles; priority-based trimming retains important messages
/// unconditionally subject to budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    /// UUIDv7 message id.
    pub id: Uuid,
    /// The message payload.
    pub message: Message,
    /// When the message was created.
    pub timestamp: DateTime<Utc>,
    /// Token count as estimated by the caller's counter.
    pub token_count: u32,
    /// Model that produced the message, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Cost in USD attributed to the message, if tracked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    /// Free-form metadata (summary tags, channel hints, ...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
    /// Whether trimming should try to retain this message.
    pub important: bool,
}

impl ConversationMessage {
    /// Wrap a message with runtime bookkeeping.
    ///
    /// `important` defaults to true for System and Tool roles.
    pub fn new(message: Message, token_count: u32) -> Self {
        let important = matches!(message.role, Role::System | Role::Tool);
        Self {
            id: Uuid::now_v7(),
            message,
            timestamp: Utc::now(),
            token_count,
            model: None,
            cost: None,
            metadata: BTreeMap::new(),
            important,
        }
    }

    /// Override the `important` flag.
    pub fn with_importance(mut self, important: bool) -> Self {
        self.important = important;
        self
    }

    /// Attach the producing model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Attach a cost figure.
    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = Some(cost);
        self
    }

    /// Insert a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Shorthand for the message role.
    pub fn role(&self) -> Role {
        self.message.role
    }

    /// Shorthand for the message content.
    pub fn content(&self) -> &str {
        &self.message.content
    }

    /// Whether this message is a synthetic trim summary.
    pub fn is_summary(&self) -> bool {
        self.metadata.get("summary").is_some_and(|v| v == "true")
    }
}

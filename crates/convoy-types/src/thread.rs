//! Conversation thread and checkpoint types.
//!
//! A `ConversationThread` is an ordered, append-only message history with a
//! lifecycle state, checkpoints, and fork support. Forking deep-copies the
//! history into a new thread that records its parent id.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::message::ConversationMessage;

/// Lifecycle state of a conversation thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadState {
    InProgress,
    WaitingForTool,
    Completed,
    Failed,
}

/// A point-in-time snapshot marker within a thread.
///
/// Checkpoints do not copy messages; they record the state and message count
/// at the moment they were taken, plus a caller-supplied note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// UUIDv7 checkpoint id.
    pub id: Uuid,
    /// Thread state at checkpoint time.
    pub state: ThreadState,
    /// Number of messages in the thread at checkpoint time.
    pub message_count: usize,
    /// When the checkpoint was taken.
    pub timestamp: DateTime<Utc>,
    /// Free-form annotation.
    pub note: String,
}

/// An ordered, append-only conversation history.
///
/// Invariant: `updated_at` is monotonically non-decreasing. Every mutation
/// goes through [`ConversationThread::touch`], which never moves the
/// timestamp backwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationThread {
    /// Thread id.
    pub id: Uuid,
    /// Set only by [`ConversationThread::fork`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Uuid>,
    /// Ordered message history.
    pub messages: Vec<ConversationMessage>,
    /// Current lifecycle state.
    pub state: ThreadState,
    /// Ordered checkpoint markers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checkpoints: Vec<Checkpoint>,
    /// Free-form thread metadata.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
    /// When the thread was created.
    pub created_at: DateTime<Utc>,
    /// When the thread was last mutated. Never decreases.
    pub updated_at: DateTime<Utc>,
}

impl ConversationThread {
    /// Create an empty thread in the `InProgress` state.
    pub fn new(id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id,
            parent_id: None,
            messages: Vec::new(),
            state: ThreadState::InProgress,
            checkpoints: Vec::new(),
            metadata: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a message and bump `updated_at`.
    pub fn push_message(&mut self, message: ConversationMessage) {
        self.messages.push(message);
        self.touch();
    }

    /// Transition the lifecycle state and bump `updated_at`.
    pub fn set_state(&mut self, state: ThreadState) {
        self.state = state;
        self.touch();
    }

    /// Record a checkpoint capturing the current state and message count.
    pub fn checkpoint(&mut self, note: impl Into<String>) -> &Checkpoint {
        let cp = Checkpoint {
            id: Uuid::now_v7(),
            state: self.state,
            message_count: self.messages.len(),
            timestamp: Utc::now(),
            note: note.into(),
        };
        self.checkpoints.push(cp);
        self.touch();
        self.checkpoints.last().expect("checkpoint just pushed")
    }

    /// Fork this thread into a new conversational branch.
    ///
    /// The fork deep-copies the message history (no sharing), records
    /// `parent_id = Some(self.id)`, resets checkpoints, and starts in
    /// `InProgress` regardless of the source state.
    pub fn fork(&self, new_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: new_id,
            parent_id: Some(self.id),
            messages: self.messages.clone(),
            state: ThreadState::InProgress,
            checkpoints: Vec::new(),
            metadata: self.metadata.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Serialize the thread to a JSON string.
    pub fn export(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Reconstruct a thread from its exported JSON form.
    pub fn import(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Total token count across all messages.
    pub fn total_tokens(&self) -> u32 {
        self.messages.iter().map(|m| m.token_count).sum()
    }

    /// Advance `updated_at` without ever moving it backwards.
    fn touch(&mut self) {
        self.updated_at = self.updated_at.max(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Message, Role};

    fn msg(role: Role, content: &str, tokens: u32) -> ConversationMessage {
        ConversationMessage::new(Message::new(role, content), tokens)
    }

    #[test]
    fn test_new_thread_starts_in_progress() {
        let t = ConversationThread::new(Uuid::now_v7());
        assert_eq!(t.state, ThreadState::InProgress);
        assert!(t.parent_id.is_none());
        assert!(t.messages.is_empty());
        assert!(t.checkpoints.is_empty());
    }

    #[test]
    fn test_push_message_bumps_updated_at() {
        let mut t = ConversationThread::new(Uuid::now_v7());
        let before = t.updated_at;
        t.push_message(msg(Role::User, "hi", 1));
        assert_eq!(t.messages.len(), 1);
        assert!(t.updated_at >= before);
    }

    #[test]
    fn test_updated_at_monotonic_across_mutations() {
        let mut t = ConversationThread::new(Uuid::now_v7());
        let mut last = t.updated_at;
        for i in 0..10 {
            t.push_message(msg(Role::User, &format!("m{i}"), 1));
            assert!(t.updated_at >= last, "updated_at went backwards");
            last = t.updated_at;
        }
        t.set_state(ThreadState::Completed);
        assert!(t.updated_at >= last);
    }

    #[test]
    fn test_checkpoint_captures_state_and_count() {
        let mut t = ConversationThread::new(Uuid::now_v7());
        t.push_message(msg(Role::User, "a", 1));
        t.push_message(msg(Role::Assistant, "b", 1));
        t.set_state(ThreadState::WaitingForTool);

        let cp = t.checkpoint("before tool").clone();
        assert_eq!(cp.state, ThreadState::WaitingForTool);
        assert_eq!(cp.message_count, 2);
        assert_eq!(cp.note, "before tool");
        assert_eq!(t.checkpoints.len(), 1);
    }

    #[test]
    fn test_fork_copies_history_and_records_parent() {
        let mut t = ConversationThread::new(Uuid::now_v7());
        t.push_message(msg(Role::System, "rules", 2));
        t.push_message(msg(Role::User, "question", 3));
        t.checkpoint("mid");
        t.set_state(ThreadState::Completed);

        let fork_id = Uuid::now_v7();
        let fork = t.fork(fork_id);

        assert_eq!(fork.id, fork_id);
        assert_eq!(fork.parent_id, Some(t.id));
        assert_eq!(fork.messages, t.messages);
        assert!(fork.checkpoints.is_empty());
        assert_eq!(fork.state, ThreadState::InProgress);
    }

    #[test]
    fn test_fork_does_not_share_history() {
        let mut t = ConversationThread::new(Uuid::now_v7());
        t.push_message(msg(Role::User, "original", 1));

        let mut fork = t.fork(Uuid::now_v7());
        fork.push_message(msg(Role::User, "branch only", 1));

        assert_eq!(t.messages.len(), 1);
        assert_eq!(fork.messages.len(), 2);
    }

    #[test]
    fn test_export_import_roundtrip() {
        let mut t = ConversationThread::new(Uuid::now_v7());
        t.push_message(msg(Role::System, "rules", 2));
        t.push_message(msg(Role::User, "hello", 1));
        t.checkpoint("cp");
        t.metadata.insert("topic".into(), "greeting".into());

        let json = t.export().unwrap();
        let restored = ConversationThread::import(&json).unwrap();
        assert_eq!(restored, t);
    }

    #[test]
    fn test_total_tokens() {
        let mut t = ConversationThread::new(Uuid::now_v7());
        t.push_message(msg(Role::User, "a", 10));
        t.push_message(msg(Role::Assistant, "b", 25));
        assert_eq!(t.total_tokens(), 35);
    }

    #[test]
    fn test_thread_state_serde() {
        let json = serde_json::to_string(&ThreadState::WaitingForTool).unwrap();
        assert_eq!(json, "\"waiting_for_tool\"");
        let parsed: ThreadState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ThreadState::WaitingForTool);
    }
}

//! ConversationStore trait definition.
//!
//! The durable-store port consumed by [`super::PersistentConversationMemory`].
//! Implementations live in the host application (SQLite, object storage,
//! whatever the deployment chooses). Uses native async fn in traits (RPITIT,
//! Rust 2024 edition).

use convoy_types::error::MemoryError;
use convoy_types::message::ConversationMessage;
use convoy_types::thread::ConversationThread;
use uuid::Uuid;

/// Port for durable conversation persistence.
pub trait ConversationStore: Send + Sync {
    /// Insert or replace a full thread.
    fn upsert_thread(
        &self,
        thread: &ConversationThread,
    ) -> impl std::future::Future<Output = Result<(), MemoryError>> + Send;

    /// Load a thread by id. Fails with `MemoryError::NotFound` when absent.
    fn load_thread(
        &self,
        thread_id: Uuid,
    ) -> impl std::future::Future<Output = Result<ConversationThread, MemoryError>> + Send;

    /// Append one message to a stored thread.
    fn append_entry(
        &self,
        thread_id: Uuid,
        message: &ConversationMessage,
    ) -> impl std::future::Future<Output = Result<(), MemoryError>> + Send;

    /// Keyword-search stored messages, newest first, truncated to `limit`.
    fn search_entries(
        &self,
        query: &str,
        limit: usize,
    ) -> impl std::future::Future<Output = Result<Vec<ConversationMessage>, MemoryError>> + Send;
}

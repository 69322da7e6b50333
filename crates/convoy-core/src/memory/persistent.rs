//! Durable conversation memory.
//!
//! Layers the in-memory fast path over a [`ConversationStore`]. Reads fall
//! through to the store on a cache miss and repopulate the cache; every
//! append writes to both sides; search prefers the cache and consults the
//! store only when the cache has nothing to offer.

use tracing::debug;
use uuid::Uuid;

use convoy_types::error::MemoryError;
use convoy_types::message::ConversationMessage;
use convoy_types::thread::ConversationThread;

use super::in_memory::InMemoryConversationMemory;
use super::store::ConversationStore;

/// Conversation memory with a durable store behind the in-memory cache.
pub struct PersistentConversationMemory<S: ConversationStore> {
    cache: InMemoryConversationMemory,
    store: S,
}

impl<S: ConversationStore> PersistentConversationMemory<S> {
    pub fn new(store: S) -> Self {
        Self {
            cache: InMemoryConversationMemory::new(),
            store,
        }
    }

    /// Append one message, writing to the cache and the store.
    pub async fn append(
        &self,
        thread_id: Uuid,
        message: ConversationMessage,
    ) -> Result<(), MemoryError> {
        self.cache.append(thread_id, message.clone())?;
        self.store.append_entry(thread_id, &message).await
    }

    /// Append a batch of messages in order, writing both sides.
    pub async fn append_all(
        &self,
        thread_id: Uuid,
        messages: Vec<ConversationMessage>,
    ) -> Result<(), MemoryError> {
        for message in messages {
            self.append(thread_id, message).await?;
        }
        Ok(())
    }

    /// Read a thread, falling through to the store on a cache miss.
    ///
    /// A store hit repopulates the cache so subsequent reads stay local.
    pub async fn read(&self, thread_id: Uuid) -> Result<ConversationThread, MemoryError> {
        match self.cache.read(thread_id) {
            Ok(thread) => Ok(thread),
            Err(MemoryError::NotFound(_)) => {
                debug!(%thread_id, "cache miss, loading thread from store");
                let thread = self.store.load_thread(thread_id).await?;
                self.cache.upsert(thread.clone())?;
                Ok(thread)
            }
            Err(other) => Err(other),
        }
    }

    /// Insert or replace a thread on both sides.
    pub async fn upsert(&self, thread: ConversationThread) -> Result<(), MemoryError> {
        self.store.upsert_thread(&thread).await?;
        self.cache.upsert(thread)
    }

    /// Fork a thread into a new branch, persisting the branch.
    ///
    /// The source is read through the cache (with store fallthrough), so a
    /// thread known only to the store can still be forked.
    pub async fn fork(
        &self,
        from_id: Uuid,
        new_id: Uuid,
    ) -> Result<ConversationThread, MemoryError> {
        let source = self.read(from_id).await?;
        let fork = source.fork(new_id);
        self.upsert(fork.clone()).await?;
        Ok(fork)
    }

    /// Keyword search preferring the cache.
    ///
    /// When the cache holds no threads at all there is nothing local to
    /// search, so the query goes to the store. A populated cache answers
    /// directly, even when it matches nothing.
    pub async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<ConversationMessage>, MemoryError> {
        if self.cache.is_empty() {
            debug!("cache empty, searching durable store");
            return self.store.search_entries(query, limit).await;
        }
        match self.cache.search(query, limit) {
            Ok(hits) => Ok(hits),
            Err(MemoryError::NotFound(_)) => self.store.search_entries(query, limit).await,
            Err(other) => Err(other),
        }
    }
}

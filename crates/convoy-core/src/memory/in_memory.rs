//! In-process conversation memory.
//!
//! Threads live in a concurrent map keyed by thread id. All mutations go
//! through the map's entry guard, so concurrent appends to one thread
//! serialize instead of losing updates, and no half-applied thread is ever
//! observable.

use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use convoy_types::error::MemoryError;
use convoy_types::message::ConversationMessage;
use convoy_types::thread::ConversationThread;

/// Append-only per-thread conversation log held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryConversationMemory {
    threads: DashMap<Uuid, ConversationThread>,
}

impl InMemoryConversationMemory {
    pub fn new() -> Self {
        Self {
            threads: DashMap::new(),
        }
    }

    /// Append one message to a thread, creating the thread when absent.
    pub fn append(
        &self,
        thread_id: Uuid,
        message: ConversationMessage,
    ) -> Result<(), MemoryError> {
        let mut entry = self
            .threads
            .entry(thread_id)
            .or_insert_with(|| ConversationThread::new(thread_id));
        entry.push_message(message);
        Ok(())
    }

    /// Append a batch of messages to a thread in order.
    pub fn append_all(
        &self,
        thread_id: Uuid,
        messages: Vec<ConversationMessage>,
    ) -> Result<(), MemoryError> {
        let mut entry = self
            .threads
            .entry(thread_id)
            .or_insert_with(|| ConversationThread::new(thread_id));
        for message in messages {
            entry.push_message(message);
        }
        Ok(())
    }

    /// Read a full thread. Fails with `NotFound` when absent.
    pub fn read(&self, thread_id: Uuid) -> Result<ConversationThread, MemoryError> {
        self.threads
            .get(&thread_id)
            .map(|t| t.clone())
            .ok_or(MemoryError::NotFound(thread_id))
    }

    /// Insert or replace a thread wholesale.
    pub fn upsert(&self, thread: ConversationThread) -> Result<(), MemoryError> {
        self.threads.insert(thread.id, thread);
        Ok(())
    }

    /// Fork an existing thread into a new branch.
    ///
    /// Fails with `NotFound` when the source is absent. The fork is stored
    /// and returned.
    pub fn fork(
        &self,
        from_id: Uuid,
        new_id: Uuid,
    ) -> Result<ConversationThread, MemoryError> {
        let fork = {
            let source = self
                .threads
                .get(&from_id)
                .ok_or(MemoryError::NotFound(from_id))?;
            source.fork(new_id)
        };
        debug!(%from_id, %new_id, "forked conversation thread");
        self.threads.insert(new_id, fork.clone());
        Ok(fork)
    }

    /// Case-insensitive keyword search across all threads.
    ///
    /// Fails with `InvalidInput` on a blank query. Results are sorted newest
    /// first by message timestamp and truncated to `limit`.
    pub fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<ConversationMessage>, MemoryError> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Err(MemoryError::InvalidInput(
                "search query must not be blank".to_string(),
            ));
        }

        let mut hits: Vec<ConversationMessage> = self
            .threads
            .iter()
            .flat_map(|entry| {
                entry
                    .messages
                    .iter()
                    .filter(|m| m.content().to_lowercase().contains(&needle))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .collect();

        hits.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        hits.truncate(limit);
        Ok(hits)
    }

    /// Ids of all threads currently held.
    pub fn thread_ids(&self) -> Vec<Uuid> {
        self.threads.iter().map(|e| *e.key()).collect()
    }

    /// Number of threads currently held.
    pub fn len(&self) -> usize {
        self.threads.len()
    }

    /// Whether the memory holds no threads.
    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }
}

//! Conversation memory: append-only per-thread logs with fork and search.
//!
//! [`InMemoryConversationMemory`] is the in-process fast path.
//! [`PersistentConversationMemory`] layers a durable [`store::ConversationStore`]
//! underneath it: reads fall through on cache miss, writes go to both.

pub mod in_memory;
pub mod persistent;
pub mod store;

pub use in_memory::InMemoryConversationMemory;
pub use persistent::PersistentConversationMemory;
pub use store::ConversationStore;

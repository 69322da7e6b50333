//! Pluggable token counting.
//!
//! The runtime never calls an external tokenizer; counts are estimates from
//! character length with a per-provider divisor, plus a small per-message
//! overhead the way chat APIs bill message framing.

use convoy_types::message::Message;

/// Fixed per-message token overhead (role framing, separators).
const MESSAGE_OVERHEAD: u32 = 4;

/// Counts tokens in text. Object-safe so callers can inject any counter.
pub trait TokenCounter: Send + Sync {
    /// Estimate the token count of a piece of text.
    fn count(&self, text: &str) -> u32;

    /// Estimate the cost of a full message, including framing overhead.
    fn count_message(&self, message: &Message) -> u32 {
        self.count(&message.content) + MESSAGE_OVERHEAD
    }
}

/// Character-ratio token estimator with provider-specific divisors.
///
/// Rough heuristic: 1 token ~ `chars_per_token` characters. Exact counting
/// would require a tokenizer, which is deliberately out of scope.
#[derive(Debug, Clone)]
pub struct HeuristicCounter {
    chars_per_token: f64,
}

impl HeuristicCounter {
    /// Build a counter for a provider tag.
    ///
    /// Known tags: "anthropic" (3.5 chars/token), "openai" (4.0). Unknown
    /// tags fall back to the conservative 4.0 default.
    pub fn for_provider(tag: &str) -> Self {
        let chars_per_token = match tag.to_lowercase().as_str() {
            "anthropic" => 3.5,
            "openai" => 4.0,
            _ => 4.0,
        };
        Self { chars_per_token }
    }

    /// Build a counter with an explicit ratio.
    pub fn with_ratio(chars_per_token: f64) -> Self {
        Self { chars_per_token }
    }
}

impl Default for HeuristicCounter {
    fn default() -> Self {
        Self::with_ratio(4.0)
    }
}

impl TokenCounter for HeuristicCounter {
    fn count(&self, text: &str) -> u32 {
        if text.is_empty() {
            return 0;
        }
        (text.len() as f64 / self.chars_per_token).ceil() as u32
    }
}

//! Context window trimming strategies.
//!
//! [`apply_window`] bounds a message sequence to token/message budgets. The
//! message-count cap is applied before the token cap. Four strategies cover
//! the trade-off between recency and importance; all of them keep at least
//! the most recent eligible message when the input is non-empty, so a budget
//! smaller than any single message yields an over-budget window rather than
//! an empty one (documented edge case, not a violation).

use std::collections::HashSet;

use tracing::debug;
use uuid::Uuid;

use convoy_types::message::{ConversationMessage, Message, Role};

use super::counter::{HeuristicCounter, TokenCounter};

/// Budgets applied to a window. `None` means unbounded on that axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowLimits {
    pub max_tokens: Option<u32>,
    pub max_messages: Option<usize>,
}

impl WindowLimits {
    /// Token budget only.
    pub fn tokens(max_tokens: u32) -> Self {
        Self {
            max_tokens: Some(max_tokens),
            max_messages: None,
        }
    }

    /// Message-count budget only.
    pub fn messages(max_messages: usize) -> Self {
        Self {
            max_tokens: None,
            max_messages: Some(max_messages),
        }
    }
}

/// How to choose which messages survive trimming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrimStrategy {
    /// Drop from the head until the cumulative cost fits the budget.
    DropOldestFifo,
    /// Retain all System messages first, then fill with the most recent
    /// non-System messages.
    SlidingWindow,
    /// Retain messages flagged `important` first, then fill with the most
    /// recent others.
    PriorityBased,
    /// Replace the oldest messages that don't fit with one synthetic summary
    /// message costing at most `target_tokens`.
    SummarizeOldest { target_tokens: u32 },
}

/// Result of a windowing pass.
#[derive(Debug, Clone)]
pub struct WindowOutcome {
    /// The bounded window, in original order.
    pub messages: Vec<ConversationMessage>,
    /// Token total of the window.
    pub total_tokens: u32,
    /// True iff the window differs from the input.
    pub trimmed: bool,
}

/// Trim `messages` to `limits` under `strategy`.
///
/// Token costs come from each message's stored `token_count` when present,
/// falling back to a provider-aware character heuristic for `provider_tag`.
/// The message-count cap (plain tail-keep) is applied before the token cap.
pub fn apply_window(
    messages: &[ConversationMessage],
    provider_tag: &str,
    limits: &WindowLimits,
    strategy: &TrimStrategy,
) -> WindowOutcome {
    let counter = HeuristicCounter::for_provider(provider_tag);
    let cost = |m: &ConversationMessage| -> u32 {
        if m.token_count > 0 {
            m.token_count
        } else {
            counter.count_message(&m.message)
        }
    };

    // Count cap first: keep the most recent `max_messages`.
    let mut working: Vec<ConversationMessage> = match limits.max_messages {
        Some(cap) if messages.len() > cap => messages[messages.len() - cap..].to_vec(),
        _ => messages.to_vec(),
    };

    if let Some(budget) = limits.max_tokens {
        working = match strategy {
            TrimStrategy::DropOldestFifo => drop_oldest(working, budget, &cost),
            TrimStrategy::SlidingWindow => {
                retain_class_first(working, budget, &cost, |m| m.role() == Role::System)
            }
            TrimStrategy::PriorityBased => {
                retain_class_first(working, budget, &cost, |m| m.important)
            }
            TrimStrategy::SummarizeOldest { target_tokens } => {
                summarize_oldest(working, budget, *target_tokens, &cost, &counter)
            }
        };
    }

    let total_tokens: u32 = working.iter().map(|m| cost(m)).sum();
    let trimmed = working.len() != messages.len()
        || working
            .iter()
            .zip(messages.iter())
            .any(|(a, b)| a.id != b.id);

    if trimmed {
        debug!(
            input = messages.len(),
            output = working.len(),
            total_tokens,
            ?strategy,
            "trimmed context window"
        );
    }

    WindowOutcome {
        messages: working,
        total_tokens,
        trimmed,
    }
}

/// Drop from the head until the cumulative cost fits, keeping at least the
/// newest message.
fn drop_oldest(
    mut messages: Vec<ConversationMessage>,
    budget: u32,
    cost: &dyn Fn(&ConversationMessage) -> u32,
) -> Vec<ConversationMessage> {
    let mut total: u32 = messages.iter().map(|m| cost(m)).sum();
    let mut start = 0;
    while total > budget && start + 1 < messages.len() {
        total -= cost(&messages[start]);
        start += 1;
    }
    messages.drain(..start);
    messages
}

/// Keep every message matching `keep_first` (newest-first when they alone
/// exceed the budget), then fill the remainder with the most recent
/// non-matching messages. Output preserves original order.
fn retain_class_first(
    messages: Vec<ConversationMessage>,
    budget: u32,
    cost: &dyn Fn(&ConversationMessage) -> u32,
    keep_first: impl Fn(&ConversationMessage) -> bool,
) -> Vec<ConversationMessage> {
    let class_cost: u32 = messages.iter().filter(|m| keep_first(m)).map(|m| cost(m)).sum();

    let mut kept: HashSet<Uuid> = HashSet::new();
    let mut spent: u32 = 0;

    if class_cost > budget {
        // The privileged class alone exceeds the budget: keep as many of its
        // members as fit, newest first, and nothing else. At least the
        // newest member survives even when it alone exceeds the budget.
        for m in messages.iter().rev().filter(|m| keep_first(m)) {
            let c = cost(m);
            if kept.is_empty() || spent + c <= budget {
                kept.insert(m.id);
                spent += c;
            }
        }
    } else {
        for m in messages.iter().filter(|m| keep_first(m)) {
            kept.insert(m.id);
        }
        spent = class_cost;
        // Fill the remainder with the most recent non-members.
        for m in messages.iter().rev().filter(|m| !keep_first(m)) {
            let c = cost(m);
            if spent + c <= budget {
                kept.insert(m.id);
                spent += c;
            }
        }
        // A window with no privileged members keeps at least the newest
        // message overall.
        if kept.is_empty() {
            if let Some(newest) = messages.last() {
                kept.insert(newest.id);
            }
        }
    }

    messages.into_iter().filter(|m| kept.contains(&m.id)).collect()
}

/// Replace the oldest messages that don't fit with one synthetic summary.
///
/// Reserves `target_tokens` for the summary, keeps the longest suffix that
/// fits the remainder (at least the newest message), and prepends a
/// System-role digest of the dropped prefix tagged `metadata["summary"]`.
fn summarize_oldest(
    messages: Vec<ConversationMessage>,
    budget: u32,
    target_tokens: u32,
    cost: &dyn Fn(&ConversationMessage) -> u32,
    counter: &HeuristicCounter,
) -> Vec<ConversationMessage> {
    let total: u32 = messages.iter().map(|m| cost(m)).sum();
    if total <= budget || messages.is_empty() {
        return messages;
    }

    let remainder = budget.saturating_sub(target_tokens);
    let mut spent: u32 = 0;
    let mut split = messages.len();
    for (i, m) in messages.iter().enumerate().rev() {
        let c = cost(m);
        if spent + c > remainder && split < messages.len() {
            break;
        }
        spent += c;
        split = i;
    }

    let (dropped, kept) = messages.split_at(split);
    if dropped.is_empty() {
        return kept.to_vec();
    }

    let summary = build_summary(dropped, target_tokens, counter);
    let mut out = Vec::with_capacity(kept.len() + 1);
    out.push(summary);
    out.extend_from_slice(kept);
    out
}

/// Digest a dropped prefix into one synthetic System message.
fn build_summary(
    dropped: &[ConversationMessage],
    target_tokens: u32,
    counter: &HeuristicCounter,
) -> ConversationMessage {
    let mut digest = format!("[Summary of {} earlier messages] ", dropped.len());
    for m in dropped {
        digest.push_str(&format!("{}: {}; ", m.role(), m.content()));
    }

    // Clamp the digest so its estimated cost stays within the target.
    // 1 token ~ 4 chars under the default heuristic.
    let max_chars = (target_tokens.saturating_mul(4)) as usize;
    if digest.len() > max_chars {
        let mut cut = max_chars.min(digest.len());
        while cut > 0 && !digest.is_char_boundary(cut) {
            cut -= 1;
        }
        digest.truncate(cut);
    }

    let tokens = counter.count(&digest).min(target_tokens);
    ConversationMessage::new(Message::new(Role::System, digest), tokens)
        .with_metadata("summary", "true")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(role: Role, content: &str, tokens: u32) -> ConversationMessage {
        ConversationMessage::new(Message::new(role, content), tokens)
    }

    fn ids(messages: &[ConversationMessage]) -> Vec<Uuid> {
        messages.iter().map(|m| m.id).collect()
    }

    #[test]
    fn test_no_limits_passes_through() {
        let input = vec![msg(Role::User, "a", 10), msg(Role::Assistant, "b", 10)];
        let out = apply_window(&input, "openai", &WindowLimits::default(), &TrimStrategy::DropOldestFifo);
        assert!(!out.trimmed);
        assert_eq!(out.total_tokens, 20);
        assert_eq!(ids(&out.messages), ids(&input));
    }

    #[test]
    fn test_fifo_three_twenty_token_messages_budget_forty() {
        let input = vec![
            msg(Role::User, "first", 20),
            msg(Role::Assistant, "second", 20),
            msg(Role::User, "third", 20),
        ];
        let out = apply_window(
            &input,
            "openai",
            &WindowLimits::tokens(40),
            &TrimStrategy::DropOldestFifo,
        );
        assert!(out.trimmed);
        assert_eq!(out.total_tokens, 40);
        assert_eq!(ids(&out.messages), ids(&input[1..]));
    }

    #[test]
    fn test_fifo_keeps_newest_even_over_budget() {
        let input = vec![msg(Role::User, "old", 10), msg(Role::User, "huge", 100)];
        let out = apply_window(
            &input,
            "openai",
            &WindowLimits::tokens(50),
            &TrimStrategy::DropOldestFifo,
        );
        assert_eq!(out.messages.len(), 1);
        assert_eq!(out.messages[0].id, input[1].id);
        // Documented edge: smallest retained message exceeds the budget.
        assert!(out.total_tokens > 50);
    }

    #[test]
    fn test_message_count_cap_applied_before_token_cap() {
        let input = vec![
            msg(Role::User, "a", 5),
            msg(Role::User, "b", 5),
            msg(Role::User, "c", 5),
            msg(Role::User, "d", 5),
        ];
        let limits = WindowLimits {
            max_tokens: Some(10),
            max_messages: Some(3),
        };
        let out = apply_window(&input, "openai", &limits, &TrimStrategy::DropOldestFifo);
        // Count cap keeps b,c,d; token cap then keeps c,d.
        assert_eq!(ids(&out.messages), ids(&input[2..]));
        assert_eq!(out.total_tokens, 10);
    }

    #[test]
    fn test_sliding_window_retains_system_first() {
        let input = vec![
            msg(Role::System, "rules", 10),
            msg(Role::User, "q1", 15),
            msg(Role::Assistant, "a1", 15),
            msg(Role::User, "q2", 15),
        ];
        let out = apply_window(
            &input,
            "openai",
            &WindowLimits::tokens(40),
            &TrimStrategy::SlidingWindow,
        );
        // System (10) + most recent non-system that fit: q2 (15), a1 (15).
        assert!(out.trimmed);
        assert_eq!(out.total_tokens, 40);
        assert_eq!(ids(&out.messages), vec![input[0].id, input[2].id, input[3].id]);
    }

    #[test]
    fn test_sliding_window_system_alone_exceeds_budget() {
        let input = vec![
            msg(Role::System, "s1", 30),
            msg(Role::User, "u", 5),
            msg(Role::System, "s2", 30),
            msg(Role::System, "s3", 30),
        ];
        let out = apply_window(
            &input,
            "openai",
            &WindowLimits::tokens(65),
            &TrimStrategy::SlidingWindow,
        );
        // System total 90 > 65: keep newest system messages that fit (s3, s2),
        // nothing else.
        assert_eq!(ids(&out.messages), vec![input[2].id, input[3].id]);
        assert_eq!(out.total_tokens, 60);
    }

    #[test]
    fn test_sliding_window_keeps_one_system_when_budget_covers_it() {
        let input = vec![msg(Role::User, "u", 50), msg(Role::System, "s", 20)];
        let out = apply_window(
            &input,
            "openai",
            &WindowLimits::tokens(20),
            &TrimStrategy::SlidingWindow,
        );
        assert_eq!(ids(&out.messages), vec![input[1].id]);
        assert_eq!(out.total_tokens, 20);
    }

    #[test]
    fn test_priority_based_retains_important() {
        let input = vec![
            msg(Role::User, "keep me", 10).with_importance(true),
            msg(Role::User, "filler 1", 20),
            msg(Role::User, "filler 2", 20),
            msg(Role::User, "recent", 15),
        ];
        let out = apply_window(
            &input,
            "openai",
            &WindowLimits::tokens(30),
            &TrimStrategy::PriorityBased,
        );
        // Important (10) + most recent other that fits (recent, 15).
        assert_eq!(ids(&out.messages), vec![input[0].id, input[3].id]);
        assert_eq!(out.total_tokens, 25);
    }

    #[test]
    fn test_priority_based_important_alone_exceed_budget() {
        let input = vec![
            msg(Role::User, "i1", 40).with_importance(true),
            msg(Role::User, "i2", 40).with_importance(true),
            msg(Role::User, "plain", 5),
        ];
        let out = apply_window(
            &input,
            "openai",
            &WindowLimits::tokens(45),
            &TrimStrategy::PriorityBased,
        );
        // Important total 80 > 45: newest important only.
        assert_eq!(ids(&out.messages), vec![input[1].id]);
    }

    #[test]
    fn test_summarize_oldest_replaces_prefix() {
        let input = vec![
            msg(Role::User, "ancient question about the project", 30),
            msg(Role::Assistant, "long ancient answer", 30),
            msg(Role::User, "recent question", 10),
            msg(Role::Assistant, "recent answer", 10),
        ];
        let out = apply_window(
            &input,
            "openai",
            &WindowLimits::tokens(40),
            &TrimStrategy::SummarizeOldest { target_tokens: 15 },
        );
        assert!(out.trimmed);
        // Summary + the two recent messages.
        assert_eq!(out.messages.len(), 3);
        let summary = &out.messages[0];
        assert!(summary.is_summary());
        assert_eq!(summary.role(), Role::System);
        assert!(summary.token_count <= 15);
        assert!(summary.content().contains("2 earlier messages"));
        assert_eq!(out.messages[1].id, input[2].id);
        assert_eq!(out.messages[2].id, input[3].id);
        assert!(out.total_tokens <= 40);
    }

    #[test]
    fn test_summarize_oldest_untouched_when_under_budget() {
        let input = vec![msg(Role::User, "a", 5), msg(Role::Assistant, "b", 5)];
        let out = apply_window(
            &input,
            "openai",
            &WindowLimits::tokens(100),
            &TrimStrategy::SummarizeOldest { target_tokens: 10 },
        );
        assert!(!out.trimmed);
        assert_eq!(out.messages.len(), 2);
    }

    #[test]
    fn test_trimmed_false_only_when_identical() {
        let input = vec![msg(Role::User, "a", 5)];
        let out = apply_window(
            &input,
            "openai",
            &WindowLimits::tokens(5),
            &TrimStrategy::DropOldestFifo,
        );
        assert!(!out.trimmed);
    }

    #[test]
    fn test_budget_respected_for_all_strategies_when_one_fits() {
        let input = vec![
            msg(Role::System, "s", 10),
            msg(Role::User, "u1", 12),
            msg(Role::Assistant, "a1", 14),
            msg(Role::User, "u2", 8),
        ];
        let budget = 20;
        for strategy in [
            TrimStrategy::DropOldestFifo,
            TrimStrategy::SlidingWindow,
            TrimStrategy::PriorityBased,
            TrimStrategy::SummarizeOldest { target_tokens: 5 },
        ] {
            let out = apply_window(&input, "openai", &WindowLimits::tokens(budget), &strategy);
            assert!(
                out.total_tokens <= budget,
                "strategy {strategy:?} exceeded budget: {}",
                out.total_tokens
            );
        }
    }

    #[test]
    fn test_zero_token_count_falls_back_to_heuristic() {
        // 40 chars -> 10 tokens + 4 overhead under the default ratio.
        let input = vec![ConversationMessage::new(
            Message::new(Role::User, "x".repeat(40)),
            0,
        )];
        let out = apply_window(
            &input,
            "openai",
            &WindowLimits::tokens(100),
            &TrimStrategy::DropOldestFifo,
        );
        assert_eq!(out.total_tokens, 14);
    }
}

//! Append-only conversation ledger.
//!
//! The ledger is the single causal record of a session: insertion order is
//! conversation order. Position 0 always holds the system turn and is
//! never trimmed; prompting reads a sliding window while the full history
//! is retained for the session lifetime.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Author of a ledger turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One immutable conversation entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    /// Monotonic index assigned at append time.
    pub sequence: u64,
}

/// Ordered sequence of turns for one session.
#[derive(Debug, Clone)]
pub struct ConversationLedger {
    turns: Vec<Turn>,
    next_sequence: u64,
}

impl ConversationLedger {
    /// Creates a ledger seeded with the system turn at position 0.
    pub fn new(system_prompt: &str) -> Self {
        let mut ledger = Self {
            turns: Vec::new(),
            next_sequence: 0,
        };
        ledger.push(Role::System, system_prompt);
        ledger
    }

    fn push(&mut self, role: Role, content: &str) -> &Turn {
        let turn = Turn {
            role,
            content: content.to_string(),
            sequence: self.next_sequence,
        };
        self.next_sequence += 1;
        self.turns.push(turn);
        self.turns.last().expect("just pushed")
    }

    /// Appends a user or assistant turn and returns it.
    pub fn append(&mut self, role: Role, content: &str) -> &Turn {
        debug_assert!(role != Role::System, "system turn is fixed at position 0");
        self.push(role, content)
    }

    /// Last `pairs * 2` turns, oldest first.
    pub fn window(&self, pairs: usize) -> &[Turn] {
        let keep = pairs * 2;
        let start = self.turns.len().saturating_sub(keep);
        &self.turns[start..]
    }

    /// All turns in causal order.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Truncates back to exactly the initial system turn.
    ///
    /// Sequence numbering continues from where it left off so that turns
    /// appended after a reset never reuse an index from before it.
    pub fn reset(&mut self) {
        self.turns.truncate(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_turn_occupies_position_zero() {
        let ledger = ConversationLedger::new("be calm");
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.turns()[0].role, Role::System);
        assert_eq!(ledger.turns()[0].sequence, 0);
    }

    #[test]
    fn append_assigns_monotonic_sequence() {
        let mut ledger = ConversationLedger::new("sys");
        ledger.append(Role::User, "hello");
        ledger.append(Role::Assistant, "hi");
        let seqs: Vec<u64> = ledger.turns().iter().map(|t| t.sequence).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
    }

    #[test]
    fn window_returns_last_pairs() {
        let mut ledger = ConversationLedger::new("sys");
        for i in 0..10 {
            ledger.append(Role::User, &format!("u{i}"));
            ledger.append(Role::Assistant, &format!("a{i}"));
        }
        let window = ledger.window(2);
        assert_eq!(window.len(), 4);
        assert_eq!(window[0].content, "u8");
        assert_eq!(window[3].content, "a9");
    }

    #[test]
    fn window_larger_than_history_returns_everything() {
        let mut ledger = ConversationLedger::new("sys");
        ledger.append(Role::User, "hello");
        assert_eq!(ledger.window(8).len(), 2);
    }

    #[test]
    fn reset_keeps_only_system_turn_and_sequence_stays_monotonic() {
        let mut ledger = ConversationLedger::new("sys");
        ledger.append(Role::User, "hello");
        ledger.append(Role::Assistant, "hi");
        ledger.reset();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.turns()[0].role, Role::System);

        let turn = ledger.append(Role::User, "again");
        assert!(turn.sequence > 2);
    }
}

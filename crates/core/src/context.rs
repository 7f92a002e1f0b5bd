//! Prompt rendering.
//!
//! Builds the single prompt string sent to the reply service: a pinned
//! memory block followed by a bounded slice of conversation history. The
//! memory block is capped at a fixed character budget so prompt size stays
//! deterministic no matter how much has been extracted.

use crate::ledger::ConversationLedger;
use crate::memory::MemoryStore;
use std::fmt::Write;

/// Hard cap on the rendered memory block, truncation marker included.
pub const MEMORY_BLOCK_MAX_CHARS: usize = 800;
/// Number of user/assistant turn pairs included in the history block.
pub const HISTORY_TURN_PAIRS: usize = 8;
/// Appended whenever the memory block had to be cut.
pub const TRUNCATION_MARKER: char = '…';

/// Renders the current memory and ledger window into one prompt string.
///
/// Pure function of its inputs: `memory-block + blank line + history`.
pub fn build_prompt(memory: &MemoryStore, ledger: &ConversationLedger) -> String {
    let mut memory_block = String::from("Pinned context:\n");
    let mut any = false;
    for (key, value) in memory.iter() {
        if let Some(value) = value {
            if any {
                memory_block.push('\n');
            }
            let _ = write!(memory_block, "{key}: {value}");
            any = true;
        }
    }
    if !any {
        memory_block.push_str("None");
    }
    let memory_block = truncate_chars(memory_block, MEMORY_BLOCK_MAX_CHARS);

    let mut history = String::new();
    for turn in ledger.window(HISTORY_TURN_PAIRS) {
        let _ = write!(
            history,
            "[{}] {}\n\n",
            turn.role.to_string().to_uppercase(),
            turn.content
        );
    }

    format!("{memory_block}\n\n{history}")
}

/// Cuts `text` to at most `max` characters, marker included.
fn truncate_chars(text: String, max: usize) -> String {
    if text.chars().count() <= max {
        return text;
    }
    let mut cut: String = text.chars().take(max - 1).collect();
    cut.push(TRUNCATION_MARKER);
    cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Role;

    fn fixtures() -> (MemoryStore, ConversationLedger) {
        (MemoryStore::new(), ConversationLedger::new("stay calm"))
    }

    #[test]
    fn renders_placeholder_when_memory_is_empty() {
        let (memory, ledger) = fixtures();
        let prompt = build_prompt(&memory, &ledger);
        assert!(prompt.starts_with("Pinned context:\nNone\n\n"));
    }

    #[test]
    fn renders_slots_in_enumeration_order() {
        let (mut memory, ledger) = fixtures();
        memory.update("fire near Boston Common in the kitchen");
        let prompt = build_prompt(&memory, &ledger);
        let fire = prompt.find("emergency_type: fire").unwrap();
        let location = prompt.find("approx_location: Boston Common").unwrap();
        let environment = prompt.find("environment: kitchen").unwrap();
        assert!(fire < location && location < environment);
    }

    #[test]
    fn history_block_contains_upper_cased_roles() {
        let (memory, mut ledger) = fixtures();
        ledger.append(Role::User, "help");
        ledger.append(Role::Assistant, "on the way");
        let prompt = build_prompt(&memory, &ledger);
        assert!(prompt.contains("[USER] help\n\n"));
        assert!(prompt.contains("[ASSISTANT] on the way\n\n"));
    }

    #[test]
    fn history_is_limited_to_the_window() {
        let (memory, mut ledger) = fixtures();
        for i in 0..20 {
            ledger.append(Role::User, &format!("u{i}"));
            ledger.append(Role::Assistant, &format!("a{i}"));
        }
        let prompt = build_prompt(&memory, &ledger);
        assert!(!prompt.contains("[USER] u11"));
        assert!(prompt.contains("[USER] u12"));
        assert!(prompt.contains("[ASSISTANT] a19"));
    }

    #[test]
    fn memory_block_never_exceeds_cap_and_ends_with_marker() {
        let (mut memory, ledger) = fixtures();
        memory.set_location_hint(&"x".repeat(2000));
        let prompt = build_prompt(&memory, &ledger);
        let memory_block = prompt.split("\n\n").next().unwrap();
        assert_eq!(memory_block.chars().count(), MEMORY_BLOCK_MAX_CHARS);
        assert!(memory_block.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn short_memory_block_carries_no_marker() {
        let (mut memory, ledger) = fixtures();
        memory.update("there is a fire");
        let prompt = build_prompt(&memory, &ledger);
        assert!(!prompt.contains(TRUNCATION_MARKER));
    }
}

//! Keyed conversational memory with keyword/pattern extraction.
//!
//! Each utterance is run through a declarative rule table mapping every
//! memory key to an ordered list of `(pattern, candidate value)` pairs.
//! Patterns match whole words only, so "windows" never triggers the storm
//! keyword "wind". The first matching pattern per key wins and at most one
//! value is assigned per key per utterance. Slots are overwritten only by
//! a differing non-null extraction and never revert to empty outside an
//! explicit bulk reset.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// The fixed slot keys, in their prompt-rendering enumeration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryKey {
    EmergencyType,
    ApproxLocation,
    Vulnerability,
    PeopleInvolved,
    Hazards,
    Environment,
    LocationHint,
}

impl MemoryKey {
    pub const ALL: [MemoryKey; 7] = [
        MemoryKey::EmergencyType,
        MemoryKey::ApproxLocation,
        MemoryKey::Vulnerability,
        MemoryKey::PeopleInvolved,
        MemoryKey::Hazards,
        MemoryKey::Environment,
        MemoryKey::LocationHint,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MemoryKey::EmergencyType => "emergency_type",
            MemoryKey::ApproxLocation => "approx_location",
            MemoryKey::Vulnerability => "vulnerability",
            MemoryKey::PeopleInvolved => "people_involved",
            MemoryKey::Hazards => "hazards",
            MemoryKey::Environment => "environment",
            MemoryKey::LocationHint => "location_hint",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for MemoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observed slot mutation, emitted for logging and diagnostics only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryChange {
    pub key: MemoryKey,
    pub value: String,
}

/// How a matching pattern produces its candidate value.
enum Candidate {
    /// A fixed value (e.g. "smoke" stores `fire`).
    Fixed(&'static str),
    /// Capture group 1 followed by a fixed noun (e.g. "3 people").
    CountOf(&'static str),
}

struct SlotRule {
    key: MemoryKey,
    patterns: Vec<(Regex, Candidate)>,
}

/// Whole-word pattern over the lower-cased utterance.
fn word(keywords: &str) -> Regex {
    Regex::new(&format!(r"\b(?:{keywords})\b")).expect("static extraction pattern")
}

/// The extraction table, defined once at store construction.
///
/// Keyword sets mirror the emergency-response domain vocabulary: rule
/// order within a key is the tie-break order, and table order fixes which
/// keys are evaluated first (only observable through change-event order).
fn rule_table() -> Vec<SlotRule> {
    vec![
        SlotRule {
            key: MemoryKey::EmergencyType,
            patterns: vec![
                (word("fire|smoke|burning"), Candidate::Fixed("fire")),
                (word("flood|flooding|water rising"), Candidate::Fixed("flood")),
                (word("earthquake|tremor|shaking"), Candidate::Fixed("earthquake")),
                (
                    word("injured|bleeding|unconscious|heart attack|collapse"),
                    Candidate::Fixed("medical"),
                ),
                (word("tornado|hurricane|storm|wind"), Candidate::Fixed("storm")),
            ],
        },
        SlotRule {
            key: MemoryKey::Vulnerability,
            patterns: vec![
                (word("child|kid|baby"), Candidate::Fixed("child")),
                (word("elderly|old|senior"), Candidate::Fixed("elderly")),
                (word("pregnant|expecting"), Candidate::Fixed("pregnant")),
            ],
        },
        SlotRule {
            key: MemoryKey::PeopleInvolved,
            patterns: vec![
                (word("alone"), Candidate::Fixed("alone")),
                (
                    Regex::new(r"\b(\d+)\s+(?:people|persons|others)\b")
                        .expect("static extraction pattern"),
                    Candidate::CountOf("people"),
                ),
            ],
        },
        SlotRule {
            key: MemoryKey::Hazards,
            patterns: vec![
                (word("gas leak"), Candidate::Fixed("gas leak")),
                (word("weapon"), Candidate::Fixed("weapon")),
                (word("gun"), Candidate::Fixed("gun")),
                (word("knife"), Candidate::Fixed("knife")),
                (word("electric"), Candidate::Fixed("electric")),
                (word("collapsed"), Candidate::Fixed("collapsed")),
            ],
        },
        SlotRule {
            key: MemoryKey::Environment,
            patterns: vec![
                (word("apartment"), Candidate::Fixed("apartment")),
                (word("house"), Candidate::Fixed("house")),
                (word("room"), Candidate::Fixed("room")),
                (word("bathroom"), Candidate::Fixed("bathroom")),
                (word("kitchen"), Candidate::Fixed("kitchen")),
                (word("garage"), Candidate::Fixed("garage")),
                (word("car"), Candidate::Fixed("car")),
                (word("building"), Candidate::Fixed("building")),
                (word("office"), Candidate::Fixed("office")),
                (word("school"), Candidate::Fixed("school")),
                (word("street"), Candidate::Fixed("street")),
            ],
        },
    ]
}

const LOCATION_SPAN_MIN_CHARS: usize = 4;
const LOCATION_SPAN_MAX_CHARS: usize = 80;

/// Keyed slots extracted from utterances.
pub struct MemoryStore {
    slots: [Option<String>; MemoryKey::ALL.len()],
    rules: Vec<SlotRule>,
    /// Case-preserving location pattern: a preposition followed by a run
    /// of capitalized-or-numeric tokens ("near Boston", "at 42nd Street").
    location: Regex,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            slots: Default::default(),
            rules: rule_table(),
            location: Regex::new(
                r"\b(?i:at|near|around|by)\s+([A-Z0-9][A-Za-z0-9'’.\-]*(?:,?\s+[A-Z0-9][A-Za-z0-9'’.\-]*)*)",
            )
            .expect("static location pattern"),
        }
    }

    /// Runs extraction over one utterance and returns the changed slots.
    ///
    /// Extraction never fails: unmatched input yields no change, and
    /// re-feeding an utterance carrying no new information is a no-op.
    pub fn update(&mut self, utterance: &str) -> Vec<MemoryChange> {
        let lowered = utterance.to_lowercase();
        let mut changes = Vec::new();

        for rule in &self.rules {
            for (pattern, candidate) in &rule.patterns {
                if let Some(caps) = pattern.captures(&lowered) {
                    let value = match candidate {
                        Candidate::Fixed(value) => (*value).to_string(),
                        Candidate::CountOf(noun) => format!("{} {noun}", &caps[1]),
                    };
                    assign(&mut self.slots, &mut changes, rule.key, value);
                    break;
                }
            }
        }

        // The explicit location pattern runs on the original casing and
        // overrides any heuristic extraction for `approx_location`.
        if let Some(span) = self.extract_location(utterance) {
            assign(&mut self.slots, &mut changes, MemoryKey::ApproxLocation, span);
        }

        for change in &changes {
            debug!(key = %change.key, value = %change.value, "memory slot stored");
        }
        changes
    }

    fn extract_location(&self, utterance: &str) -> Option<String> {
        let caps = self.location.captures(utterance)?;
        let span = caps[1].trim_end_matches(['.', ',', '-', ' ']).to_string();
        let chars = span.chars().count();
        (LOCATION_SPAN_MIN_CHARS..=LOCATION_SPAN_MAX_CHARS)
            .contains(&chars)
            .then_some(span)
    }

    /// Current value of one slot.
    pub fn get(&self, key: MemoryKey) -> Option<&str> {
        self.slots[key.index()].as_deref()
    }

    /// Slots in enumeration order, empty or not.
    pub fn iter(&self) -> impl Iterator<Item = (MemoryKey, Option<&str>)> {
        MemoryKey::ALL.iter().map(|&key| (key, self.get(key)))
    }

    /// Sets the coarse location hint supplied by the hosting environment
    /// (e.g. an IP-geolocation probe run outside this engine).
    pub fn set_location_hint(&mut self, hint: &str) {
        let mut changes = Vec::new();
        assign(
            &mut self.slots,
            &mut changes,
            MemoryKey::LocationHint,
            hint.to_string(),
        );
    }

    /// Bulk reset: the only path by which a slot returns to empty.
    pub fn clear(&mut self) {
        self.slots = Default::default();
    }
}

/// Writes `value` into the slot only when it differs from the current one.
fn assign(
    slots: &mut [Option<String>; MemoryKey::ALL.len()],
    changes: &mut Vec<MemoryChange>,
    key: MemoryKey,
    value: String,
) {
    if slots[key.index()].as_deref() == Some(value.as_str()) {
        return;
    }
    slots[key.index()] = Some(value.clone());
    // A later pattern may supersede an earlier assignment to the same key
    // within one call; keep a single change entry per key.
    changes.retain(|c| c.key != key);
    changes.push(MemoryChange { key, value });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(changes: &[MemoryChange]) -> Vec<MemoryKey> {
        changes.iter().map(|c| c.key).collect()
    }

    #[test]
    fn extracts_emergency_type_from_keyword() {
        let mut store = MemoryStore::new();
        let changes = store.update("there is smoke everywhere");
        assert_eq!(keys(&changes), vec![MemoryKey::EmergencyType]);
        assert_eq!(store.get(MemoryKey::EmergencyType), Some("fire"));
    }

    #[test]
    fn whole_word_boundary_prevents_substring_match() {
        let mut store = MemoryStore::new();
        let changes = store.update("I am stuck between two windows");
        assert_eq!(store.get(MemoryKey::EmergencyType), None);
        assert!(changes.is_empty());
    }

    #[test]
    fn first_matching_pattern_wins_per_key() {
        // "fire" precedes "flood" in the rule table, so a sentence with
        // both keywords stores fire.
        let mut store = MemoryStore::new();
        store.update("the flood started a fire");
        assert_eq!(store.get(MemoryKey::EmergencyType), Some("fire"));
    }

    #[test]
    fn refeeding_same_utterance_changes_nothing() {
        let mut store = MemoryStore::new();
        let first = store.update("a fire in the kitchen");
        assert_eq!(first.len(), 2);
        let second = store.update("a fire in the kitchen");
        assert!(second.is_empty());
    }

    #[test]
    fn unmatched_utterance_leaves_existing_slots_alone() {
        let mut store = MemoryStore::new();
        store.update("there is a fire");
        let changes = store.update("never mind, it's fine");
        assert!(changes.is_empty());
        assert_eq!(store.get(MemoryKey::EmergencyType), Some("fire"));
    }

    #[test]
    fn extracts_verbatim_location_after_preposition() {
        let mut store = MemoryStore::new();
        store.update("There's a fire near Boston and I'm alone");
        assert_eq!(store.get(MemoryKey::ApproxLocation), Some("Boston"));
        assert_eq!(store.get(MemoryKey::EmergencyType), Some("fire"));
        assert_eq!(store.get(MemoryKey::PeopleInvolved), Some("alone"));
    }

    #[test]
    fn location_preserves_casing_and_spans_tokens() {
        let mut store = MemoryStore::new();
        store.update("we are trapped at North Station platform");
        // Lowercase "platform" terminates the capitalized run.
        assert_eq!(store.get(MemoryKey::ApproxLocation), Some("North Station"));
    }

    #[test]
    fn location_run_may_cross_commas() {
        let mut store = MemoryStore::new();
        store.update("the building collapsed near Boston, MA");
        assert_eq!(store.get(MemoryKey::ApproxLocation), Some("Boston, MA"));
    }

    #[test]
    fn too_short_location_span_is_rejected() {
        let mut store = MemoryStore::new();
        store.update("meet me by NYC");
        assert_eq!(store.get(MemoryKey::ApproxLocation), None);
    }

    #[test]
    fn counts_people_involved() {
        let mut store = MemoryStore::new();
        store.update("there are 3 people with me");
        assert_eq!(store.get(MemoryKey::PeopleInvolved), Some("3 people"));
    }

    #[test]
    fn alone_takes_priority_over_count() {
        let mut store = MemoryStore::new();
        store.update("I'm alone but saw 3 people outside");
        assert_eq!(store.get(MemoryKey::PeopleInvolved), Some("alone"));
    }

    #[test]
    fn extracts_hazard_and_environment() {
        let mut store = MemoryStore::new();
        let changes = store.update("gas leak in the garage");
        assert_eq!(store.get(MemoryKey::Hazards), Some("gas leak"));
        assert_eq!(store.get(MemoryKey::Environment), Some("garage"));
        assert_eq!(changes.len(), 2);
    }

    #[test]
    fn at_most_one_change_per_key_per_call() {
        let mut store = MemoryStore::new();
        let changes = store.update("fire near Boston Harbor");
        let location_changes = changes
            .iter()
            .filter(|c| c.key == MemoryKey::ApproxLocation)
            .count();
        assert_eq!(location_changes, 1);
    }

    #[test]
    fn clear_empties_every_slot() {
        let mut store = MemoryStore::new();
        store.update("fire near Boston and I'm alone in the kitchen");
        store.clear();
        for (_, value) in store.iter() {
            assert!(value.is_none());
        }
    }

    #[test]
    fn location_hint_is_set_directly() {
        let mut store = MemoryStore::new();
        store.set_location_hint("Boston, MA, US");
        assert_eq!(store.get(MemoryKey::LocationHint), Some("Boston, MA, US"));
    }
}

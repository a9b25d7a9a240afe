//! Applying a voice analysis to the persona memory.
//!
//! The analysis itself comes from the generation engine (see the workflow
//! crate); this module only merges it into a memory snapshot and runs the
//! safety checks that decide whether the result may be saved.

use crate::model::{CurrentState, PersonaMemory, VoiceExample};
use serde::{Deserialize, Serialize};

/// Upper bound on stored voice examples.
pub const MAX_VOICE_EXAMPLES: usize = 12;

/// At most this many new examples are taken from one analysis.
pub const MAX_NEW_EXAMPLES: usize = 2;

/// Words that mark an example as marketing copy rather than real voice.
pub const MARKETING_WORDS: [&str; 5] = [
    "leverage",
    "synergy",
    "disrupt",
    "revolutionary",
    "game-changing",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedExample {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub why: String,
}

/// Structured result of a voice analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryAnalysis {
    #[serde(default)]
    pub voice_patterns_found: Vec<String>,
    #[serde(default)]
    pub new_voice_examples: Vec<ProposedExample>,
    #[serde(default)]
    pub new_voice_donts: Vec<String>,
    #[serde(default)]
    pub new_style_notes: Vec<String>,
    #[serde(default)]
    pub context_updates: Vec<String>,
    #[serde(default)]
    pub current_state: Option<CurrentState>,
    /// Indices into the current voice examples
    #[serde(default)]
    pub remove_weak_examples: Vec<usize>,
    #[serde(default)]
    pub reasoning: String,
}

/// Merge `analysis` into a copy of `current`.
///
/// Weak examples are only removed when new ones are being added. Returns
/// the updated memory and a human-readable list of changes.
pub fn apply_analysis(current: &PersonaMemory, analysis: &MemoryAnalysis) -> (PersonaMemory, Vec<String>) {
    let mut updated = current.clone();
    let mut changes = Vec::new();

    if !analysis.new_voice_examples.is_empty() {
        let mut weak = analysis.remove_weak_examples.clone();
        weak.sort_unstable_by(|a, b| b.cmp(a));
        weak.dedup();
        for idx in weak {
            if idx < updated.voice_examples.len() {
                let removed = updated.voice_examples.remove(idx);
                changes.push(format!("Removed weak example: {}", removed.title));
            }
        }

        for example in analysis.new_voice_examples.iter().take(MAX_NEW_EXAMPLES) {
            if updated.voice_examples.len() >= MAX_VOICE_EXAMPLES {
                break;
            }
            updated
                .voice_examples
                .push(VoiceExample::new(&example.title, &example.content));
            changes.push(format!("Added voice example: {}", example.title));
        }
    }

    for phrase in &analysis.new_voice_donts {
        if PersonaMemory::push_unique(&mut updated.voice_donts, phrase) {
            changes.push(format!("Added voice don't: {phrase}"));
        }
    }

    for note in &analysis.new_style_notes {
        if PersonaMemory::push_unique(&mut updated.style_notes, note) {
            changes.push(format!("Added style note: {note}"));
        }
    }

    for update in &analysis.context_updates {
        if PersonaMemory::push_unique(&mut updated.context_memories, update) {
            changes.push(format!("Added context: {update}"));
        }
    }

    if let Some(state) = &analysis.current_state {
        updated.current_state = Some(state.clone());
        changes.push("Updated current state".to_string());
    }

    (updated, changes)
}

/// Problems that must block saving `memory`.
pub fn safety_issues(memory: &PersonaMemory) -> Vec<String> {
    let mut issues = Vec::new();

    if memory.voice_examples.len() > MAX_VOICE_EXAMPLES {
        issues.push(format!("Too many voice examples (>{MAX_VOICE_EXAMPLES})"));
    }

    for example in &memory.voice_examples {
        let content = example.content.to_lowercase();
        if MARKETING_WORDS.iter().any(|w| content.contains(w)) {
            issues.push(format!("Marketing language detected in: {}", example.title));
        }
    }

    issues
}

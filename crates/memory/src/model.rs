//! The persona memory document and its prompt rendering.

use chrono::Local;
use serde::{Deserialize, Serialize};

/// A sample of the writer's real prose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceExample {
    pub title: String,
    pub content: String,
    /// Local ISO-8601 timestamp of when the example was added
    #[serde(default)]
    pub added: String,
}

impl VoiceExample {
    /// A new example stamped with the current local time.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            added: timestamp_now(),
        }
    }
}

/// Where the writer is right now. Written by the context updater.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentState {
    #[serde(default)]
    pub phase: String,
    #[serde(default)]
    pub energy: String,
    #[serde(default)]
    pub focus: Vec<String>,
    #[serde(default)]
    pub avoid_this_week: Vec<String>,
}

/// Everything the pipeline knows about the writer's voice.
///
/// `voice_donts`, `style_notes` and `context_memories` hold distinct
/// strings in insertion order; `voice_examples` may repeat titles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaMemory {
    #[serde(default)]
    pub voice_examples: Vec<VoiceExample>,
    #[serde(default)]
    pub voice_donts: Vec<String>,
    #[serde(default)]
    pub style_notes: Vec<String>,
    #[serde(default)]
    pub context_memories: Vec<String>,
    #[serde(default)]
    pub current_projects: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_state: Option<CurrentState>,
}

pub const VOICE_EXAMPLES_HEADER: &str = "=== VOICE EXAMPLES (Your Actual Writing) ===";
pub const VOICE_DONTS_HEADER: &str = "=== NEVER USE THESE PHRASES ===";
pub const STYLE_NOTES_HEADER: &str = "=== ADDITIONAL STYLE NOTES ===";
pub const CONTEXT_HEADER: &str = "=== CONTEXT & BACKGROUND ===";
pub const PROJECTS_HEADER: &str = "=== CURRENT PROJECTS ===";

impl PersonaMemory {
    /// Append `value` to `list` unless an identical string is present.
    /// Returns whether it was appended.
    pub fn push_unique(list: &mut Vec<String>, value: &str) -> bool {
        if list.iter().any(|v| v == value) {
            return false;
        }
        list.push(value.to_string());
        true
    }

    pub fn is_empty(&self) -> bool {
        self.voice_examples.is_empty()
            && self.voice_donts.is_empty()
            && self.style_notes.is_empty()
            && self.context_memories.is_empty()
            && self.current_projects.is_empty()
    }

    /// Compose `base` with every non-empty memory section, in fixed order.
    pub fn render(&self, base: &str) -> String {
        let mut out = String::with_capacity(base.len() + 2);
        out.push_str(base);
        out.push_str("\n\n");

        if !self.voice_examples.is_empty() {
            out.push_str(VOICE_EXAMPLES_HEADER);
            out.push_str("\n\n");
            for example in &self.voice_examples {
                out.push_str(&format!("{}:\n{}\n\n", example.title, example.content));
            }
        }

        render_list(&mut out, VOICE_DONTS_HEADER, &self.voice_donts);
        render_list(&mut out, STYLE_NOTES_HEADER, &self.style_notes);
        render_list(&mut out, CONTEXT_HEADER, &self.context_memories);
        render_list(&mut out, PROJECTS_HEADER, &self.current_projects);

        out
    }
}

fn render_list(out: &mut String, header: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    out.push_str(header);
    out.push_str("\n- ");
    out.push_str(&items.join("\n- "));
    out.push_str("\n\n");
}

/// Current local time as a naive ISO-8601 string.
pub fn timestamp_now() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

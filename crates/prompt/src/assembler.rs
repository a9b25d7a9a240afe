//! System-prompt assembly.
//!
//! Blocks are appended in a fixed order:
//!
//! 1. Base instructions + persona memory sections
//! 2. Lens guidance
//! 3. Calendar observance (calendar lens with caller-supplied text only)
//! 4. Editing instructions
//! 5. Voice parameters
//!
//! Assembly is deterministic for a given memory snapshot and lens
//! selection; [`compose`] is the pure core and is reused by the budget
//! enforcer when re-rendering after a prune.

use crate::voice::VoiceParameters;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use zabal_config::BudgetConfig;
use zabal_core::diagnostics::{Diagnostics, Verbosity};
use zabal_lens::{LensSelection, LensSelector};
use zabal_memory::{PersonaMemory, PersonaMemoryStore};

// ── Types ─────────────────────────────────────────────────────────────────

/// Everything the caller controls about one prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblyRequest {
    pub base_prompt: String,
    pub daily_input: String,
    #[serde(default)]
    pub lens_override: Option<String>,
    #[serde(default)]
    pub calendar_key: Option<String>,
    /// Observance text to ground the entry in (calendar lens only)
    #[serde(default)]
    pub calendar_text: Option<String>,
    #[serde(default)]
    pub editing_instructions: Option<String>,
    #[serde(default)]
    pub voice_parameters: Option<VoiceParameters>,
}

impl AssemblyRequest {
    pub fn new(base_prompt: impl Into<String>, daily_input: impl Into<String>) -> Self {
        Self {
            base_prompt: base_prompt.into(),
            daily_input: daily_input.into(),
            ..Self::default()
        }
    }

    pub fn with_lens_override(mut self, lens: Option<String>) -> Self {
        self.lens_override = lens;
        self
    }

    pub fn with_calendar(mut self, key: Option<String>, text: Option<String>) -> Self {
        self.calendar_key = key;
        self.calendar_text = text;
        self
    }

    pub fn with_editing_instructions(mut self, instructions: Option<String>) -> Self {
        self.editing_instructions = instructions.filter(|i| !i.trim().is_empty());
        self
    }

    pub fn with_voice_parameters(mut self, params: Option<VoiceParameters>) -> Self {
        self.voice_parameters = params;
        self
    }
}

/// An assembled prompt plus what it was built from.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub prompt: String,
    pub lens: LensSelection,
    /// The memory snapshot rendered into `prompt`
    pub memory: PersonaMemory,
}

impl Assembly {
    pub fn char_len(&self) -> usize {
        self.prompt.chars().count()
    }
}

// ── Assembler ─────────────────────────────────────────────────────────────

pub struct PromptAssembler {
    pub(crate) store: PersonaMemoryStore,
    selector: LensSelector,
    pub(crate) budget: Arc<BudgetConfig>,
    pub(crate) diagnostics: Diagnostics,
}

impl PromptAssembler {
    pub fn new(store: PersonaMemoryStore, selector: LensSelector, budget: Arc<BudgetConfig>) -> Self {
        Self {
            store,
            selector,
            budget,
            diagnostics: Diagnostics::silent(),
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn store(&self) -> &PersonaMemoryStore {
        &self.store
    }

    pub fn selector(&self) -> &LensSelector {
        &self.selector
    }

    pub fn budget(&self) -> &BudgetConfig {
        &self.budget
    }

    /// Load memory, select a lens, and compose the prompt.
    pub fn assemble(&self, request: &AssemblyRequest) -> Assembly {
        let memory = self.store.load();
        let lens = self.selector.select(
            &request.daily_input,
            request.lens_override.as_deref(),
            request.calendar_key.as_deref(),
        );
        let prompt = compose(&memory, request, &lens);

        if self.diagnostics.assembly_enabled(Verbosity::Basic) {
            self.diagnostics.section("PROMPT ASSEMBLY", Verbosity::Basic);
            self.diagnostics.log(
                "PROMPT LENGTH",
                &format!("{} chars", prompt.chars().count()),
                Verbosity::Basic,
            );
            self.diagnostics.log(
                "BLOCKS",
                &format!(
                    "calendar={} editing={} voice_parameters={}",
                    request.calendar_text.is_some() && lens.is_calendar(),
                    request.editing_instructions.is_some(),
                    request.voice_parameters.is_some()
                ),
                Verbosity::Verbose,
            );
            self.diagnostics.log("FULL PROMPT", &prompt, Verbosity::Trace);
        }

        Assembly { prompt, lens, memory }
    }
}

/// Render `memory` and every requested block onto the base prompt.
pub fn compose(memory: &PersonaMemory, request: &AssemblyRequest, lens: &LensSelection) -> String {
    let mut prompt = memory.render(&request.base_prompt);

    prompt.push_str(&format!(
        "=== MINDFUL LENS: {} ===\n{}\n\n",
        lens.lens_id,
        lens.guidance_text()
    ));

    if let Some(text) = request.calendar_text.as_deref().filter(|t| !t.trim().is_empty()) {
        if lens.is_calendar() {
            prompt.push_str("=== ROJ OBSERVANCE ===\n");
            prompt.push_str(&format!("Today's observance: {}\n", text.trim()));
            prompt.push_str(
                "Ground today's entry in this observance. Let it shape the reflection \
                 without explaining the tradition.\n\n",
            );
        }
    }

    if let Some(instructions) = request.editing_instructions.as_deref().filter(|i| !i.trim().is_empty()) {
        prompt.push_str("=== EDITING INSTRUCTIONS ===\n");
        prompt.push_str(
            "Apply these edits while preserving the established voice and structure:\n",
        );
        prompt.push_str(instructions.trim());
        prompt.push_str("\n\n");
    }

    if let Some(params) = &request.voice_parameters {
        prompt.push_str("=== VOICE PARAMETERS ===\n");
        prompt.push_str(&params.guidance());
        prompt.push_str("\n\n");
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use zabal_config::LensRegistry;

    const REGISTRY: &str = r#"{
        "personal_observation": {"tone": "grounded", "guidance": ["Write what happened"], "avoid": [], "use_when": []},
        "stoic": {"tone": "steady", "guidance": ["Control what you can"], "avoid": ["Self-pity"], "use_when": ["setback"]},
        "zoroastrian_roj": {"tone": "reverent", "guidance": [], "avoid": [], "use_when": [],
            "roj_calendar": {"hormozd": "Day of wisdom"}}
    }"#;

    fn assembler(dir: &tempfile::TempDir) -> PromptAssembler {
        let store = PersonaMemoryStore::new(dir.path().join("personality.json"));
        let selector = LensSelector::new(Arc::new(LensRegistry::from_json(REGISTRY).unwrap()));
        PromptAssembler::new(store, selector, Arc::new(BudgetConfig::default()))
    }

    #[test]
    fn minimal_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let a = assembler(&dir).assemble(&AssemblyRequest::new("BASE", ""));
        assert_eq!(a.lens.lens_id, "personal_observation");
        assert_eq!(
            a.prompt,
            "BASE\n\n=== MINDFUL LENS: personal_observation ===\n\
             TONE: grounded\n\nGUIDANCE:\n- Write what happened\n\nAVOID:\n\n"
        );
    }

    #[test]
    fn memory_sections_precede_lens_block() {
        let dir = tempfile::tempdir().unwrap();
        let a = assembler(&dir);
        a.store().add_style_note("Short sentences").unwrap();
        let prompt = a.assemble(&AssemblyRequest::new("BASE", "Another setback")).prompt;
        let notes = prompt.find("=== ADDITIONAL STYLE NOTES ===").unwrap();
        let lens = prompt.find("=== MINDFUL LENS: stoic ===").unwrap();
        assert!(notes < lens);
    }

    #[test]
    fn block_order_is_fixed() {
        let dir = tempfile::tempdir().unwrap();
        let request = AssemblyRequest::new("BASE", "")
            .with_lens_override(Some("zoroastrian_roj".into()))
            .with_calendar(Some("hormozd".into()), Some("Hormozd: wisdom".into()))
            .with_editing_instructions(Some("Cut the second paragraph".into()))
            .with_voice_parameters(Some(VoiceParameters::new(5, 5, 5, 5).unwrap()));
        let prompt = assembler(&dir).assemble(&request).prompt;

        let positions: Vec<usize> = [
            "=== MINDFUL LENS: zoroastrian_roj ===",
            "TODAY'S ROJ OBSERVANCE:\nDay of wisdom",
            "=== ROJ OBSERVANCE ===\nToday's observance: Hormozd: wisdom",
            "=== EDITING INSTRUCTIONS ===",
            "=== VOICE PARAMETERS ===",
        ]
        .iter()
        .map(|h| prompt.find(h).unwrap())
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn calendar_text_ignored_for_other_lenses() {
        let dir = tempfile::tempdir().unwrap();
        let request = AssemblyRequest::new("BASE", "Hit a setback")
            .with_calendar(None, Some("Hormozd: wisdom".into()));
        let prompt = assembler(&dir).assemble(&request).prompt;
        assert!(!prompt.contains("=== ROJ OBSERVANCE ==="));
    }

    #[test]
    fn blank_editing_instructions_dropped() {
        let request = AssemblyRequest::new("B", "x").with_editing_instructions(Some("   ".into()));
        assert!(request.editing_instructions.is_none());
    }

    #[test]
    fn assembly_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let a = assembler(&dir);
        a.store().add_voice_example("Day 1", "Woke up.").unwrap();
        let request = AssemblyRequest::new("BASE", "setback");
        let first = a.assemble(&request);
        let second = a.assemble(&request);
        assert_eq!(first.prompt, second.prompt);
        assert_eq!(compose(&first.memory, &request, &first.lens), first.prompt);
    }
}

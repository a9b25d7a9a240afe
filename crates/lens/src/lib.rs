//! Mindful lens selection.
//!
//! Picks the contemplative framing for a day's writing. Resolution order,
//! first match wins:
//!
//! 1. An explicit override naming a known lens (`"auto"` means none).
//! 2. Empty input selects [`DEFAULT_LENS`].
//! 3. A calendar phrase (`roj:` / `today is`) followed by a calendar key
//!    makes the calendar lens a candidate.
//! 4. Every other lens is scored by how many of its trigger phrases occur
//!    in the input.
//! 5. The calendar candidate wins unless some lens scored 2 or more;
//!    otherwise the best score wins, ties going to the lens declared first.

use serde::Serialize;
use std::sync::Arc;
use zabal_config::lenses::{CALENDAR_LENS, DEFAULT_LENS, LensDescriptor, LensRegistry};
use zabal_core::diagnostics::{Diagnostics, Verbosity};

/// Phrases that announce a calendar observance in the daily input.
pub const CALENDAR_MARKERS: [&str; 2] = ["roj:", "today is"];

/// A trigger score at or above this beats a detected calendar observance.
const CALENDAR_OVERRIDE_SCORE: usize = 2;

/// The outcome of lens selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LensSelection {
    pub lens_id: String,
    pub descriptor: LensDescriptor,
    pub reason: String,
    pub calendar_guidance: Option<String>,
    pub calendar_key: Option<String>,
}

impl LensSelection {
    pub fn is_calendar(&self) -> bool {
        self.lens_id == CALENDAR_LENS
    }

    /// Guidance block for this selection.
    pub fn guidance_text(&self) -> String {
        render_guidance(&self.lens_id, &self.descriptor, self.calendar_guidance.as_deref())
    }
}

pub struct LensSelector {
    registry: Arc<LensRegistry>,
    diagnostics: Diagnostics,
}

impl LensSelector {
    pub fn new(registry: Arc<LensRegistry>) -> Self {
        Self {
            registry,
            diagnostics: Diagnostics::silent(),
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn registry(&self) -> &LensRegistry {
        &self.registry
    }

    /// Choose a lens for `input`.
    pub fn select(&self, input: &str, lens_override: Option<&str>, calendar_key: Option<&str>) -> LensSelection {
        let selection = self.resolve(input, lens_override, calendar_key);
        self.narrate(&selection);
        selection
    }

    fn resolve(&self, input: &str, lens_override: Option<&str>, calendar_key: Option<&str>) -> LensSelection {
        if let Some(id) = lens_override.filter(|id| *id != "auto") {
            if let Some(descriptor) = self.registry.get(id) {
                let (calendar_guidance, key) = if id == CALENDAR_LENS {
                    match calendar_key.and_then(|k| self.lookup_calendar(k)) {
                        Some((k, g)) => (Some(g), Some(k)),
                        None => (None, calendar_key.map(str::to_lowercase)),
                    }
                } else {
                    (None, None)
                };
                return LensSelection {
                    lens_id: id.to_string(),
                    descriptor: descriptor.clone(),
                    reason: "manual override".into(),
                    calendar_guidance,
                    calendar_key: key,
                };
            }
            tracing::warn!(lens = %id, "Unknown lens override, falling back to automatic selection");
        }

        if input.trim().is_empty() {
            return self.default_selection("no input provided");
        }

        let input_lower = input.to_lowercase();
        let calendar_candidate = self.detect_calendar(&input_lower);

        // Declaration order; replace only on a strictly higher score.
        let mut best: Option<(&str, &LensDescriptor, Vec<&str>)> = None;
        for (id, lens) in self.registry.iter() {
            if id == CALENDAR_LENS {
                continue;
            }
            let matched: Vec<&str> = lens
                .use_when
                .iter()
                .filter(|t| !t.is_empty() && input_lower.contains(&t.to_lowercase()))
                .map(String::as_str)
                .collect();
            if matched.is_empty() {
                continue;
            }
            if best.as_ref().is_none_or(|(_, _, m)| matched.len() > m.len()) {
                best = Some((id, lens, matched));
            }
        }

        let best_score = best.as_ref().map_or(0, |(_, _, m)| m.len());

        if let Some((key, guidance)) = calendar_candidate {
            if best_score < CALENDAR_OVERRIDE_SCORE {
                let descriptor = self.registry.get(CALENDAR_LENS).cloned().unwrap_or_default();
                return LensSelection {
                    lens_id: CALENDAR_LENS.to_string(),
                    descriptor,
                    reason: format!("calendar observance detected: {key}"),
                    calendar_guidance: Some(guidance),
                    calendar_key: Some(key),
                };
            }
        }

        match best {
            Some((id, lens, matched)) => LensSelection {
                lens_id: id.to_string(),
                descriptor: lens.clone(),
                reason: format!("matched: {}", matched.join(", ")),
                calendar_guidance: None,
                calendar_key: None,
            },
            None => self.default_selection("no specific triggers"),
        }
    }

    /// First calendar key (declaration order) mentioned after a calendar marker.
    fn detect_calendar(&self, input_lower: &str) -> Option<(String, String)> {
        if !CALENDAR_MARKERS.iter().any(|m| input_lower.contains(m)) {
            return None;
        }
        self.registry
            .calendar()?
            .iter()
            .find(|(key, _)| input_lower.contains(&key.to_lowercase()))
            .map(|(key, guidance)| (key.to_lowercase(), guidance.clone()))
    }

    fn lookup_calendar(&self, key: &str) -> Option<(String, String)> {
        let key = key.trim().to_lowercase();
        self.registry
            .calendar()?
            .iter()
            .find(|(k, _)| k.to_lowercase() == key)
            .map(|(_, guidance)| (key.clone(), guidance.clone()))
    }

    fn default_selection(&self, reason: &str) -> LensSelection {
        LensSelection {
            lens_id: DEFAULT_LENS.to_string(),
            descriptor: self.registry.get(DEFAULT_LENS).cloned().unwrap_or_default(),
            reason: reason.to_string(),
            calendar_guidance: None,
            calendar_key: None,
        }
    }

    /// Guidance block for any lens id. Unknown ids render an empty descriptor.
    pub fn guidance_text(&self, lens_id: &str, calendar_guidance: Option<&str>) -> String {
        let empty = LensDescriptor::default();
        let descriptor = self.registry.get(lens_id).unwrap_or(&empty);
        render_guidance(lens_id, descriptor, calendar_guidance)
    }

    fn narrate(&self, selection: &LensSelection) {
        if !self.diagnostics.assembly_enabled(Verbosity::Basic) {
            return;
        }
        self.diagnostics.section("MINDFUL LENS SELECTION", Verbosity::Basic);
        self.diagnostics.log("SELECTED LENS", &selection.lens_id, Verbosity::Basic);
        self.diagnostics.log("REASON", &selection.reason, Verbosity::Verbose);
        self.diagnostics.log("TONE", &selection.descriptor.tone, Verbosity::Verbose);
        if let Some(key) = &selection.calendar_key {
            self.diagnostics.log("ROJ", key, Verbosity::Verbose);
        }
    }
}

fn render_guidance(lens_id: &str, lens: &LensDescriptor, calendar_guidance: Option<&str>) -> String {
    let bullets = |items: &[String]| {
        items
            .iter()
            .map(|i| format!("- {i}"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let mut text = format!(
        "TONE: {}\n\nGUIDANCE:\n{}\n\nAVOID:\n{}",
        lens.tone,
        bullets(&lens.guidance),
        bullets(&lens.avoid)
    )
    .trim()
    .to_string();

    if lens_id == CALENDAR_LENS {
        if let Some(guidance) = calendar_guidance.filter(|g| !g.trim().is_empty()) {
            text.push_str("\n\nTODAY'S ROJ OBSERVANCE:\n");
            text.push_str(guidance);
        }
    }

    text
}

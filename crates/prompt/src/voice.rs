//! Voice parameters: four 1–10 sliders turned into one sentence each.

use crate::PromptError;
use serde::{Deserialize, Serialize};

pub const MIN_LEVEL: i64 = 1;
pub const MAX_LEVEL: i64 = 10;

/// Where a slider value falls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Low,
    Balanced,
    High,
}

impl Band {
    /// `<= 3` is low, `>= 7` is high.
    pub fn of(value: u8) -> Self {
        match value {
            ..=3 => Self::Low,
            7.. => Self::High,
            _ => Self::Balanced,
        }
    }
}

/// Validated slider settings. Construct through [`VoiceParameters::new`]
/// or deserialize; both reject values outside 1–10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawVoiceParameters")]
pub struct VoiceParameters {
    formality: u8,
    energy_level: u8,
    reflection_depth: u8,
    personal_universal: u8,
}

#[derive(Deserialize)]
struct RawVoiceParameters {
    formality: i64,
    energy_level: i64,
    reflection_depth: i64,
    personal_universal: i64,
}

impl TryFrom<RawVoiceParameters> for VoiceParameters {
    type Error = PromptError;

    fn try_from(raw: RawVoiceParameters) -> Result<Self, Self::Error> {
        Self::new(
            raw.formality,
            raw.energy_level,
            raw.reflection_depth,
            raw.personal_universal,
        )
    }
}

fn level(name: &'static str, value: i64) -> Result<u8, PromptError> {
    if (MIN_LEVEL..=MAX_LEVEL).contains(&value) {
        Ok(value as u8)
    } else {
        Err(PromptError::InvalidVoiceParameter { name, value })
    }
}

impl VoiceParameters {
    pub fn new(
        formality: i64,
        energy_level: i64,
        reflection_depth: i64,
        personal_universal: i64,
    ) -> Result<Self, PromptError> {
        Ok(Self {
            formality: level("formality", formality)?,
            energy_level: level("energy_level", energy_level)?,
            reflection_depth: level("reflection_depth", reflection_depth)?,
            personal_universal: level("personal_universal", personal_universal)?,
        })
    }

    pub fn formality(&self) -> u8 {
        self.formality
    }

    pub fn energy_level(&self) -> u8 {
        self.energy_level
    }

    pub fn reflection_depth(&self) -> u8 {
        self.reflection_depth
    }

    pub fn personal_universal(&self) -> u8 {
        self.personal_universal
    }

    /// One guidance sentence per slider, in fixed order.
    pub fn guidance(&self) -> String {
        let formality = match Band::of(self.formality) {
            Band::Low => "Keep it casual and conversational, like talking to a close friend.",
            Band::Balanced => "Use a relaxed but considered tone.",
            Band::High => "Write with composed, polished phrasing.",
        };
        let energy = match Band::of(self.energy_level) {
            Band::Low => "Keep the energy calm and unhurried.",
            Band::Balanced => "Hold a steady, even energy.",
            Band::High => "Bring high energy and forward momentum.",
        };
        let reflection = match Band::of(self.reflection_depth) {
            Band::Low => "Stay close to what happened, with only light reflection.",
            Band::Balanced => "Mix what happened with a moderate amount of reflection.",
            Band::High => "Go deep on meaning and inner experience.",
        };
        let scope = match Band::of(self.personal_universal) {
            Band::Low => "Keep it personal and rooted in the specifics of your own day.",
            Band::Balanced => "Balance personal detail with a takeaway others can relate to.",
            Band::High => "Widen out toward lessons that apply to everyone.",
        };
        [formality, energy, reflection, scope].join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_thresholds() {
        assert_eq!(Band::of(1), Band::Low);
        assert_eq!(Band::of(3), Band::Low);
        assert_eq!(Band::of(4), Band::Balanced);
        assert_eq!(Band::of(6), Band::Balanced);
        assert_eq!(Band::of(7), Band::High);
        assert_eq!(Band::of(10), Band::High);
    }

    #[test]
    fn out_of_range_rejected() {
        let err = VoiceParameters::new(5, 0, 5, 5).unwrap_err();
        assert!(matches!(
            err,
            PromptError::InvalidVoiceParameter { name: "energy_level", value: 0 }
        ));
        assert!(VoiceParameters::new(5, 5, 11, 5).is_err());
    }

    #[test]
    fn deserialization_validates() {
        let ok: VoiceParameters = serde_json::from_str(
            r#"{"formality": 2, "energy_level": 5, "reflection_depth": 9, "personal_universal": 5}"#,
        )
        .unwrap();
        assert_eq!(ok.formality(), 2);

        let bad = serde_json::from_str::<VoiceParameters>(
            r#"{"formality": 12, "energy_level": 5, "reflection_depth": 9, "personal_universal": 5}"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn guidance_has_one_sentence_per_slider() {
        let params = VoiceParameters::new(1, 5, 10, 5).unwrap();
        let text = params.guidance();
        assert!(text.starts_with("Keep it casual"));
        assert!(text.contains("Hold a steady, even energy."));
        assert!(text.contains("Go deep on meaning"));
        assert!(text.ends_with("takeaway others can relate to."));
        assert_eq!(text.matches(". ").count(), 3);
    }
}

//! The mindful-lens registry.
//!
//! Lenses are kept in the order the document declares them. That order is
//! the tie-break when two lenses score equally during selection.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// Lens used when nothing in the input points elsewhere.
pub const DEFAULT_LENS: &str = "personal_observation";

/// The calendar lens. Only chosen by override or calendar-phrase detection.
pub const CALENDAR_LENS: &str = "zoroastrian_roj";

/// Tone, guidance and trigger phrases for one lens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LensDescriptor {
    #[serde(default)]
    pub tone: String,

    #[serde(default)]
    pub guidance: Vec<String>,

    #[serde(default)]
    pub avoid: Vec<String>,

    /// Trigger phrases matched case-insensitively against the daily input.
    #[serde(default)]
    pub use_when: Vec<String>,

    /// Calendar key → observance guidance (calendar lens only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roj_calendar: Option<IndexMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LensRegistry {
    lenses: IndexMap<String, LensDescriptor>,
}

impl LensRegistry {
    /// Load the registry. A missing or malformed document degrades to an
    /// empty registry so generation can continue with the default lens.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Lens registry unavailable, using empty registry");
                return Self::default();
            }
        };

        match Self::from_json(&content) {
            Ok(registry) => registry,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Malformed lens registry, using empty registry");
                Self::default()
            }
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn get(&self, id: &str) -> Option<&LensDescriptor> {
        self.lenses.get(id)
    }

    /// Lenses in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &LensDescriptor)> {
        self.lenses.iter().map(|(id, lens)| (id.as_str(), lens))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.lenses.keys().map(String::as_str)
    }

    /// Calendar keys in declaration order, if the calendar lens has any.
    pub fn calendar(&self) -> Option<&IndexMap<String, String>> {
        self.get(CALENDAR_LENS).and_then(|l| l.roj_calendar.as_ref())
    }

    pub fn len(&self) -> usize {
        self.lenses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lenses.is_empty()
    }
}

//! Prompt character budget.

use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A persona-memory category the budget enforcer may trim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PruneCategory {
    VoiceExamples,
    StyleNotes,
}

impl PruneCategory {
    /// Items that are never pruned away.
    pub fn floor(&self) -> usize {
        match self {
            Self::VoiceExamples => 3,
            Self::StyleNotes => 5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VoiceExamples => "voice_examples",
            Self::StyleNotes => "style_notes",
        }
    }
}

impl std::fmt::Display for PruneCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Soft target, hard limit, and the categories to trim, in priority order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetConfig {
    pub target_chars: usize,
    pub hard_limit: usize,
    #[serde(default = "default_prune_order")]
    pub prune_order: Vec<PruneCategory>,
}

fn default_prune_order() -> Vec<PruneCategory> {
    vec![PruneCategory::VoiceExamples, PruneCategory::StyleNotes]
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            target_chars: 12_000,
            hard_limit: 16_000,
            prune_order: default_prune_order(),
        }
    }
}

impl BudgetConfig {
    /// Load from a JSON document.
    ///
    /// A missing file yields the built-in default. A file that exists but
    /// does not parse or validate is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "No budget file found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let budget: Self = serde_json::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        budget.validate()?;
        Ok(budget)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_chars == 0 {
            return Err(ConfigError::ValidationError(
                "budget target_chars must be > 0".into(),
            ));
        }
        if self.hard_limit < self.target_chars {
            return Err(ConfigError::ValidationError(format!(
                "budget hard_limit ({}) must be >= target_chars ({})",
                self.hard_limit, self.target_chars
            )));
        }
        for (i, category) in self.prune_order.iter().enumerate() {
            if self.prune_order[..i].contains(category) {
                return Err(ConfigError::ValidationError(format!(
                    "budget prune_order lists '{category}' more than once"
                )));
            }
        }
        Ok(())
    }
}

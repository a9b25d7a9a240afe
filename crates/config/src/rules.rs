//! Editorial rules ("the constitution") applied to generated text.
//!
//! Unlike the lens registry and persona memory, a missing or malformed
//! rules document is an error: generation does not proceed unchecked.

use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_SIGNATURE: &str = "– BetterCallZaal on behalf of the ZABAL Team";
pub const DEFAULT_SIGNATURE_MARKER: &str = "BetterCallZaal";
pub const DEFAULT_SOCIAL_PREFIX: &str = "ZM";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorialRules {
    /// Phrases that must never appear (case-insensitive)
    #[serde(default)]
    pub hard_bans: Vec<String>,

    #[serde(default)]
    pub output_constraints: OutputConstraints,
}

/// Per-content-type constraints. Either block may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConstraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub newsletter: Option<NewsletterConstraints>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social: Option<SocialConstraints>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsletterConstraints {
    #[serde(default)]
    pub require_signature: bool,

    #[serde(default = "default_closing_sentences")]
    pub closing_line_max_sentences: usize,

    /// Exact signature line that must appear.
    #[serde(default = "default_signature")]
    pub signature: String,

    /// Lines containing this are not treated as the closing line.
    #[serde(default = "default_signature_marker")]
    pub signature_marker: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialConstraints {
    #[serde(default, rename = "require_ZM_prefix")]
    pub require_zm_prefix: bool,

    #[serde(default)]
    pub no_emojis: bool,

    #[serde(default)]
    pub no_hashtags: bool,

    #[serde(default = "default_prefix")]
    pub prefix: String,
}

fn default_closing_sentences() -> usize {
    1
}
fn default_signature() -> String {
    DEFAULT_SIGNATURE.into()
}
fn default_signature_marker() -> String {
    DEFAULT_SIGNATURE_MARKER.into()
}
fn default_prefix() -> String {
    DEFAULT_SOCIAL_PREFIX.into()
}

impl Default for NewsletterConstraints {
    fn default() -> Self {
        Self {
            require_signature: false,
            closing_line_max_sentences: default_closing_sentences(),
            signature: default_signature(),
            signature_marker: default_signature_marker(),
        }
    }
}

impl Default for SocialConstraints {
    fn default() -> Self {
        Self {
            require_zm_prefix: false,
            no_emojis: false,
            no_hashtags: false,
            prefix: default_prefix(),
        }
    }
}

impl EditorialRules {
    /// Load and validate the rules document.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let rules: Self = serde_json::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        rules.validate()?;
        tracing::debug!(
            path = %path.display(),
            bans = rules.hard_bans.len(),
            "Loaded editorial rules"
        );
        Ok(rules)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hard_bans.iter().any(|b| b.trim().is_empty()) {
            return Err(ConfigError::ValidationError(
                "hard_bans must not contain empty phrases".into(),
            ));
        }

        if let Some(news) = &self.output_constraints.newsletter {
            if news.closing_line_max_sentences == 0 {
                return Err(ConfigError::ValidationError(
                    "closing_line_max_sentences must be >= 1".into(),
                ));
            }
            if news.signature.trim().is_empty() || news.signature_marker.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "newsletter signature and signature_marker must not be empty".into(),
                ));
            }
            // Otherwise an appended signature would itself count as the closing line.
            if !news.signature.contains(&news.signature_marker) {
                return Err(ConfigError::ValidationError(format!(
                    "newsletter signature must contain the marker '{}'",
                    news.signature_marker
                )));
            }
        }

        if let Some(social) = &self.output_constraints.social {
            if social.prefix.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "social prefix must not be empty".into(),
                ));
            }
        }

        Ok(())
    }
}

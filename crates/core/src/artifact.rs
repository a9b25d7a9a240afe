//! Generated artifacts and their content types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What kind of text the pipeline is producing.
///
/// Editorial constraints are keyed by content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Newsletter,
    Social,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Newsletter => "newsletter",
            Self::Social => "social",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "newsletter" => Ok(Self::Newsletter),
            "social" => Ok(Self::Social),
            other => Err(format!("unknown content type '{other}' (expected newsletter or social)")),
        }
    }
}

/// A text blob produced by the generation engine, tagged with its type.
///
/// Not persisted by the core; archiving is the workflow's concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedArtifact {
    pub content_type: ContentType,
    pub text: String,
    pub generated_at: DateTime<Utc>,
}

impl GeneratedArtifact {
    pub fn new(content_type: ContentType, text: impl Into<String>) -> Self {
        Self {
            content_type,
            text: text.into(),
            generated_at: Utc::now(),
        }
    }
}

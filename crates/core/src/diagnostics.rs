//! Pipeline diagnostics: controllable narration of what the pipeline did.
//!
//! A [`Diagnostics`] value is built once from configuration and handed to
//! every component that narrates (lens selection, prompt assembly,
//! constitution checks). Verbosity is a constructor parameter, never global
//! state. Events are emitted through `tracing` under the
//! `zabal::pipeline` target, so the subscriber configured by the binary
//! decides where they end up.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// How much of the pipeline to narrate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    #[default]
    Off,
    Basic,
    Verbose,
    Trace,
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Off => "off",
            Self::Basic => "basic",
            Self::Verbose => "verbose",
            Self::Trace => "trace",
        };
        f.write_str(s)
    }
}

impl FromStr for Verbosity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "none" => Ok(Self::Off),
            "basic" => Ok(Self::Basic),
            "verbose" => Ok(Self::Verbose),
            "trace" => Ok(Self::Trace),
            other => Err(format!("unknown verbosity '{other}'")),
        }
    }
}

const TRUNCATION_SUFFIX: &str = " …[truncated]";

/// Explicit logging handle passed into pipeline components.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    verbosity: Verbosity,
    /// Truncate logged text to this many characters.
    max_chars: Option<usize>,
    /// Narrate prompt assembly, lens choice and constitution results.
    prompt_assembly: bool,
}

impl Diagnostics {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            max_chars: None,
            prompt_assembly: verbosity > Verbosity::Off,
        }
    }

    /// Diagnostics that never narrate anything.
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn with_truncation(mut self, max_chars: Option<usize>) -> Self {
        self.max_chars = max_chars;
        self
    }

    pub fn with_prompt_assembly(mut self, enabled: bool) -> Self {
        self.prompt_assembly = enabled;
        self
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// Whether a message at `level` would be emitted.
    pub fn enabled(&self, level: Verbosity) -> bool {
        self.verbosity != Verbosity::Off && level != Verbosity::Off && self.verbosity >= level
    }

    /// Whether prompt-assembly narration at `level` would be emitted.
    pub fn assembly_enabled(&self, level: Verbosity) -> bool {
        self.prompt_assembly && self.enabled(level)
    }

    /// Emit a labelled message if `level` is enabled.
    pub fn log(&self, label: &str, message: &str, level: Verbosity) {
        if !self.enabled(level) {
            return;
        }
        let message = self.truncate(message);
        info!(target: "zabal::pipeline", label, level = %level, "{message}");
    }

    /// Emit a section divider if `level` is enabled.
    pub fn section(&self, title: &str, level: Verbosity) {
        if !self.enabled(level) {
            return;
        }
        info!(target: "zabal::pipeline", level = %level, "==== {title} ====");
    }

    /// Apply the configured truncation to `text`.
    pub fn truncate<'a>(&self, text: &'a str) -> Cow<'a, str> {
        match self.max_chars {
            Some(max) if text.chars().count() > max => {
                let cut: String = text.chars().take(max).collect();
                Cow::Owned(format!("{cut}{TRUNCATION_SUFFIX}"))
            }
            _ => Cow::Borrowed(text),
        }
    }
}

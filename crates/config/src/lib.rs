//! Configuration loading, validation, and management for ZABAL.
//!
//! Two kinds of configuration live here:
//!
//! - [`AppConfig`]: process settings loaded from `~/.zabal/config.toml`
//!   with environment variable overrides (provider, model, paths, logging).
//! - The pipeline documents ([`BudgetConfig`], [`LensRegistry`] and
//!   [`EditorialRules`]): JSON files loaded once into validated structures
//!   and shared read-only for the rest of the run.

pub mod budget;
pub mod lenses;
pub mod rules;

pub use budget::{BudgetConfig, PruneCategory};
pub use lenses::{CALENDAR_LENS, DEFAULT_LENS, LensDescriptor, LensRegistry};
pub use rules::{EditorialRules, NewsletterConstraints, OutputConstraints, SocialConstraints};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use zabal_core::diagnostics::{Diagnostics, Verbosity};

/// The root configuration structure.
///
/// Maps directly to `~/.zabal/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default generation provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per generation
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Where documents, prompts and output live
    #[serde(default)]
    pub paths: PathsConfig,

    /// Pipeline diagnostics
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Generation behaviour
    #[serde(default)]
    pub generation: GenerationConfig,

    /// HTTP front end
    #[serde(default)]
    pub gateway: GatewayConfig,
}

fn default_provider() -> String {
    "groq".into()
}
fn default_model() -> String {
    "llama-3.3-70b-versatile".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    2000
}
fn default_true() -> bool {
    true
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("providers", &self.providers)
            .field("paths", &self.paths)
            .field("logging", &self.logging)
            .field("generation", &self.generation)
            .field("gateway", &self.gateway)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

/// File locations. Relative paths resolve against `root`
/// (default: the config directory, `~/.zabal`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,

    #[serde(default = "default_memory_file")]
    pub memory_file: PathBuf,

    #[serde(default = "default_lenses_file")]
    pub lenses_file: PathBuf,

    #[serde(default = "default_rules_file")]
    pub rules_file: PathBuf,

    #[serde(default = "default_budget_file")]
    pub budget_file: PathBuf,

    #[serde(default = "default_backups_dir")]
    pub backups_dir: PathBuf,

    #[serde(default = "default_prompts_dir")]
    pub prompts_dir: PathBuf,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_memory_file() -> PathBuf {
    PathBuf::from("memory/personality.json")
}
fn default_lenses_file() -> PathBuf {
    PathBuf::from("memory/mindful_lenses.json")
}
fn default_rules_file() -> PathBuf {
    PathBuf::from("memory/editorial_rules.json")
}
fn default_budget_file() -> PathBuf {
    PathBuf::from("memory/prompt_budget.json")
}
fn default_backups_dir() -> PathBuf {
    PathBuf::from("memory/backups")
}
fn default_prompts_dir() -> PathBuf {
    PathBuf::from("prompts")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            root: None,
            memory_file: default_memory_file(),
            lenses_file: default_lenses_file(),
            rules_file: default_rules_file(),
            budget_file: default_budget_file(),
            backups_dir: default_backups_dir(),
            prompts_dir: default_prompts_dir(),
            output_dir: default_output_dir(),
        }
    }
}

impl PathsConfig {
    /// The directory relative paths resolve against.
    pub fn root(&self) -> PathBuf {
        self.root.clone().unwrap_or_else(AppConfig::config_dir)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        // `join` keeps absolute paths as-is.
        self.root().join(path)
    }

    pub fn memory_path(&self) -> PathBuf {
        self.resolve(&self.memory_file)
    }

    pub fn lenses_path(&self) -> PathBuf {
        self.resolve(&self.lenses_file)
    }

    pub fn rules_path(&self) -> PathBuf {
        self.resolve(&self.rules_file)
    }

    pub fn budget_path(&self) -> PathBuf {
        self.resolve(&self.budget_file)
    }

    pub fn backups_path(&self) -> PathBuf {
        self.resolve(&self.backups_dir)
    }

    pub fn prompts_path(&self) -> PathBuf {
        self.resolve(&self.prompts_dir)
    }

    pub fn output_path(&self) -> PathBuf {
        self.resolve(&self.output_dir)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Pipeline narration level: off, basic, verbose, trace
    #[serde(default)]
    pub level: Verbosity,

    /// Emit JSON log lines instead of human-readable ones
    #[serde(default)]
    pub json: bool,

    /// Narrate prompt assembly, lens choice and constitution results
    #[serde(default = "default_true")]
    pub log_prompt_assembly: bool,

    #[serde(default)]
    pub truncate_long_text: bool,

    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
}

fn default_max_chars() -> usize {
    800
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Verbosity::Off,
            json: false,
            log_prompt_assembly: true,
            truncate_long_text: false,
            max_chars: default_max_chars(),
        }
    }
}

impl LoggingConfig {
    /// Build the diagnostics handle shared by pipeline components.
    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics::new(self.level)
            .with_prompt_assembly(self.log_prompt_assembly)
            .with_truncation(self.truncate_long_text.then_some(self.max_chars))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Apply safe auto-fixes to generated text
    #[serde(default = "default_true")]
    pub auto_fix: bool,

    /// Day 1 of the writing year. `None` numbers days by day-of-year.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_epoch: Option<NaiveDate>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            auto_fix: true,
            day_epoch: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    5000
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (`~/.zabal/config.toml`).
    ///
    /// Also checks environment variables:
    /// - `ZABAL_API_KEY` (highest priority), then the default provider's own
    ///   key variable (`GROQ_API_KEY`, `OPENAI_API_KEY`, ...)
    /// - `ZABAL_PROVIDER`, `ZABAL_MODEL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        Self::load_with_env(&config_path)
    }

    /// Load from a specific file, then apply environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        // Allow env var to override default provider
        if let Ok(provider) = std::env::var("ZABAL_PROVIDER") {
            self.default_provider = provider;
        }

        // Allow env var to override default model
        if let Ok(model) = std::env::var("ZABAL_MODEL") {
            self.default_model = model;
        }

        if self.api_key.is_none() {
            self.api_key = std::env::var("ZABAL_API_KEY").ok().or_else(|| {
                provider_env_var(&self.default_provider).and_then(|var| std::env::var(var).ok())
            });
        }
    }

    /// Get the configuration directory path (`$ZABAL_HOME` or `~/.zabal`).
    pub fn config_dir() -> PathBuf {
        std::env::var("ZABAL_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| dirs_home().join(".zabal"))
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.logging.truncate_long_text && self.logging.max_chars == 0 {
            return Err(ConfigError::ValidationError(
                "logging.max_chars must be > 0 when truncate_long_text is set".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
            || self
                .providers
                .get(&self.default_provider)
                .is_some_and(|p| p.api_key.is_some())
    }

    /// Generate a default config TOML string (for the `init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            providers: HashMap::new(),
            paths: PathsConfig::default(),
            logging: LoggingConfig::default(),
            generation: GenerationConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

/// The API key environment variable of a well-known provider.
pub fn provider_env_var(provider: &str) -> Option<&'static str> {
    match provider {
        "groq" => Some("GROQ_API_KEY"),
        "openrouter" => Some("OPENROUTER_API_KEY"),
        "openai" => Some("OPENAI_API_KEY"),
        "anthropic" => Some("ANTHROPIC_API_KEY"),
        _ => None,
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

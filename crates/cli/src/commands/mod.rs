//! Subcommand implementations and the helpers they share.

pub mod check;
pub mod full;
pub mod init;
pub mod interactive;
pub mod lens;
pub mod memory;
pub mod newsletter;
pub mod serve;
pub mod social;
pub mod update;

use chrono::NaiveDate;
use clap::Args;
use std::io::Read;
use std::path::{Path, PathBuf};
use zabal_config::AppConfig;
use zabal_workflow::{GenerationResult, GenerationWorkflow, NewsletterRequest, VoiceParameters};

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Load config from `path`, or from `~/.zabal/config.toml`.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(p) => AppConfig::load_with_env(p),
        None => AppConfig::load(),
    }
    .map_err(|e| format!("Failed to load config: {e}"))?;
    Ok(config)
}

/// Wire the generation workflow against the configured provider.
pub fn build_workflow(config: &AppConfig) -> Result<GenerationWorkflow, Box<dyn std::error::Error>> {
    if !config.has_api_key() {
        return Err(format!(
            "No API key for provider '{}'. Set ZABAL_API_KEY or add it to config.toml",
            config.default_provider
        )
        .into());
    }

    let router = zabal_providers::build_from_config(config);
    let provider = router.require_default()?;
    let model = zabal_providers::default_model(config);
    Ok(GenerationWorkflow::from_config(config, provider, model)?)
}

/// Newsletter inputs shared by `newsletter` and `full`.
#[derive(Debug, Args)]
pub struct NewsletterArgs {
    /// Daily input text (reads --input-file or stdin when omitted)
    pub input: Option<String>,

    /// File holding the daily input
    #[arg(short, long)]
    pub input_file: Option<PathBuf>,

    /// "You Are a Badass" quote or reflection
    #[arg(short, long)]
    pub quote: Option<String>,

    /// Force a lens id instead of automatic selection
    #[arg(long)]
    pub lens: Option<String>,

    /// Calendar observance key (e.g. a roj name)
    #[arg(long)]
    pub calendar_key: Option<String>,

    /// Observance text to ground the entry in
    #[arg(long)]
    pub calendar_text: Option<String>,

    /// Free-text editing instructions
    #[arg(short, long)]
    pub edit: Option<String>,

    /// Voice sliders as formality,energy,depth,personal-universal (each 1-10)
    #[arg(long, value_parser = parse_voice)]
    pub voice: Option<VoiceParameters>,

    /// Entry date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

impl NewsletterArgs {
    pub fn into_request(self) -> Result<NewsletterRequest, Box<dyn std::error::Error>> {
        let daily_input = match (self.input, &self.input_file) {
            (Some(text), _) => text,
            (None, Some(path)) => std::fs::read_to_string(path)
                .map_err(|e| format!("Failed to read {}: {e}", path.display()))?,
            (None, None) => read_stdin()?,
        };

        Ok(NewsletterRequest {
            daily_input,
            quote: self.quote,
            lens_override: self.lens,
            calendar_key: self.calendar_key,
            calendar_text: self.calendar_text,
            editing_instructions: self.edit,
            voice_parameters: self.voice,
            date: self.date,
        })
    }
}

fn parse_voice(s: &str) -> Result<VoiceParameters, String> {
    let values = s
        .split(',')
        .map(|v| v.trim().parse::<i64>().map_err(|e| format!("'{v}': {e}")))
        .collect::<Result<Vec<_>, _>>()?;
    match values.as_slice() {
        [f, e, r, p] => VoiceParameters::new(*f, *e, *r, *p).map_err(|e| e.to_string()),
        _ => Err(format!("expected 4 comma-separated values, got {}", values.len())),
    }
}

pub fn read_stdin() -> Result<String, Box<dyn std::error::Error>> {
    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

/// Print a generation result the way every generating command does.
pub fn print_result(title: &str, result: &GenerationResult) {
    println!("\n{title}");
    println!("{}", "=".repeat(title.chars().count()));
    if let Some(day) = result.day_number {
        println!("  Day:     {day} ({})", result.date);
    }
    if let (Some(lens), Some(reason)) = (&result.lens_id, &result.lens_reason) {
        println!("  Lens:    {lens} ({reason})");
    }
    if let Some(status) = result.budget_status {
        if status.is_warning() {
            println!("  ⚠️  Prompt budget: {status:?}");
        }
    }
    for item in &result.pruned {
        println!("  Pruned:  {}: {}", item.category, item.item);
    }
    if result.auto_fixed {
        println!("  Auto-fix applied");
    }
    println!("  Saved:   {}", result.saved);
    println!("\n{}\n", result.text());

    if result.is_clean() {
        println!("✅ All editorial checks passed");
    } else {
        println!("⚠️  Needs review:");
        for issue in &result.remaining_issues {
            println!("   - {issue}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voice_parses_four_values() {
        let v = parse_voice("3, 5,7,10").unwrap();
        assert_eq!(v, VoiceParameters::new(3, 5, 7, 10).unwrap());
    }

    #[test]
    fn voice_rejects_bad_input() {
        assert!(parse_voice("3,5,7").is_err());
        assert!(parse_voice("3,5,7,11").is_err());
        assert!(parse_voice("a,b,c,d").is_err());
    }
}

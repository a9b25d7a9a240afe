//! `zabal check`: Run the editorial checks on a text file.

use super::{CmdResult, load_config};
use std::path::Path;
use std::sync::Arc;
use zabal_config::EditorialRules;
use zabal_constitution::ConstitutionChecker;
use zabal_core::ContentType;

pub async fn run(config_path: Option<&Path>, file: &Path, content_type: &str, fix: bool) -> CmdResult {
    let config = load_config(config_path)?;
    let content_type: ContentType = content_type.parse()?;
    let rules = EditorialRules::load(&config.paths.rules_path())?;
    let text = std::fs::read_to_string(file)
        .map_err(|e| format!("Failed to read {}: {e}", file.display()))?;

    let checker = ConstitutionChecker::new(Arc::new(rules)).with_diagnostics(config.logging.diagnostics());
    let report = checker.validate(&text, content_type, fix);

    if report.was_modified {
        println!("{}\n", report.text);
    }

    if report.is_clean() {
        println!("✅ {} passes all editorial checks", file.display());
        return Ok(());
    }

    println!("⚠️  {} issue(s) in {}:", report.remaining_issues.len(), file.display());
    for issue in &report.remaining_issues {
        let hint = if issue.is_auto_fixable() { " (fixable with --fix)" } else { "" };
        println!("   - {issue}{hint}");
    }

    Err(format!("{} editorial issue(s) remain", report.remaining_issues.len()).into())
}

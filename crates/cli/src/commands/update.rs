//! `zabal update-context`: Learn voice updates from writing samples.

use super::{CmdResult, load_config};
use std::path::{Path, PathBuf};
use zabal_memory::PersonaMemoryStore;
use zabal_workflow::ContextUpdater;

pub async fn run(
    config_path: Option<&Path>,
    files: Vec<PathBuf>,
    mut samples: Vec<String>,
    feedback: Option<String>,
    dry_run: bool,
) -> CmdResult {
    let config = load_config(config_path)?;

    for path in &files {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
        samples.push(text);
    }
    if samples.is_empty() {
        return Err("Provide at least one writing sample (file or --text)".into());
    }

    let router = zabal_providers::build_from_config(&config);
    let provider = router.require_default()?;
    let diagnostics = config.logging.diagnostics();
    let store = PersonaMemoryStore::new(config.paths.memory_path()).with_diagnostics(diagnostics.clone());
    let updater = ContextUpdater::new(
        store,
        provider,
        zabal_providers::default_model(&config),
        config.paths.backups_path(),
    )
    .with_diagnostics(diagnostics);

    tracing::info!(samples = samples.len(), dry_run, "Starting context update");
    println!("🔍 Analyzing {} writing sample(s)...", samples.len());
    let report = updater.update(&samples, feedback.as_deref(), dry_run).await?;

    if let Some(path) = &report.backup_path {
        println!("✅ Backed up to: {}", path.display());
    }
    if !report.voice_patterns_found.is_empty() {
        println!("\n  Patterns found:");
        for pattern in &report.voice_patterns_found {
            println!("   - {pattern}");
        }
    }

    println!("\n  Changes:");
    if report.changes.is_empty() {
        println!("   (none)");
    }
    for change in &report.changes {
        println!("   - {change}");
    }
    if !report.reasoning.is_empty() {
        println!("\n  Reasoning: {}", report.reasoning);
    }

    if !report.safety_issues.is_empty() {
        println!("\n⚠️  Safety issues (would block saving):");
        for issue in &report.safety_issues {
            println!("   - {issue}");
        }
    }

    if report.saved {
        println!("\n✅ Memory updated. Next: generate a test newsletter to check the voice.");
    } else {
        println!("\n  Dry run: nothing saved.");
    }

    Ok(())
}

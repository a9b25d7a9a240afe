//! `zabal lens`: Show which mindful lens an input selects.

use super::{CmdResult, load_config};
use std::path::Path;
use std::sync::Arc;
use zabal_config::LensRegistry;
use zabal_lens::LensSelector;

pub async fn run(
    config_path: Option<&Path>,
    input: &str,
    lens_override: Option<&str>,
    calendar_key: Option<&str>,
) -> CmdResult {
    let config = load_config(config_path)?;
    let registry = LensRegistry::load(&config.paths.lenses_path());

    println!("🔭 Lenses loaded: {}", registry.len());
    for id in registry.ids() {
        println!("   - {id}");
    }

    let selector = LensSelector::new(Arc::new(registry)).with_diagnostics(config.logging.diagnostics());
    let selection = selector.select(input, lens_override, calendar_key);

    println!("\n  Selected: {}", selection.lens_id);
    println!("  Reason:   {}", selection.reason);
    if let Some(key) = &selection.calendar_key {
        println!("  Roj:      {key}");
    }
    println!("\n{}\n", selection.guidance_text());

    Ok(())
}

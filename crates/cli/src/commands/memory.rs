//! `zabal memory`: Inspect or extend persona memory.

use super::{CmdResult, load_config};
use std::path::Path;
use zabal_core::MemoryError;
use zabal_memory::PersonaMemoryStore;

fn store(config_path: Option<&Path>) -> Result<PersonaMemoryStore, Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    Ok(PersonaMemoryStore::new(config.paths.memory_path()).with_diagnostics(config.logging.diagnostics()))
}

pub async fn show(config_path: Option<&Path>) -> CmdResult {
    let store = store(config_path)?;
    let memory = store.load();

    println!("🧠 Persona Memory ({})", store.path().display());
    println!("===================");
    println!("  Voice examples:   {}", memory.voice_examples.len());
    println!("  Voice don'ts:     {}", memory.voice_donts.len());
    println!("  Style notes:      {}", memory.style_notes.len());
    println!("  Context memories: {}", memory.context_memories.len());
    println!("  Current projects: {}", memory.current_projects.len());
    println!();
    println!("{}", serde_json::to_string_pretty(&memory)?);

    Ok(())
}

pub async fn add_example(config_path: Option<&Path>, title: &str, content: &str) -> CmdResult {
    let store = store(config_path)?;
    store.add_voice_example(title, content)?;
    println!("✅ Added voice example: {title}");
    Ok(())
}

pub async fn add_note(config_path: Option<&Path>, note: &str) -> CmdResult {
    report("style note", note, store(config_path)?.add_style_note(note))
}

pub async fn add_dont(config_path: Option<&Path>, phrase: &str) -> CmdResult {
    report("voice don't", phrase, store(config_path)?.add_voice_dont(phrase))
}

pub async fn add_context(config_path: Option<&Path>, text: &str) -> CmdResult {
    report("context memory", text, store(config_path)?.add_context_memory(text))
}

fn report(kind: &str, value: &str, result: Result<bool, MemoryError>) -> CmdResult {
    if result? {
        println!("✅ Added {kind}: {value}");
    } else {
        println!("  Already present, unchanged: {value}");
    }
    Ok(())
}

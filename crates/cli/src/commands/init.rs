//! `zabal init`: First-time setup.
//!
//! Writes `config.toml` and seeds every document the pipeline reads. Files
//! that already exist are left alone.

use super::{CmdResult, load_config};
use std::path::Path;
use zabal_config::AppConfig;
use zabal_workflow::PromptTemplates;
use zabal_workflow::prompts::{NEWSLETTER_TEMPLATE_FILE, SOCIAL_TEMPLATE_FILE};

const SEED_RULES: &str = include_str!("../../../../data/memory/editorial_rules.json");
const SEED_LENSES: &str = include_str!("../../../../data/memory/mindful_lenses.json");
const SEED_BUDGET: &str = include_str!("../../../../data/memory/prompt_budget.json");
const SEED_PERSONALITY: &str = include_str!("../../../../data/memory/personality.json");

pub async fn run(config_path: Option<&Path>) -> CmdResult {
    let config_file = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"));

    println!("🌱 ZABAL: First-Time Setup");
    println!("==========================\n");

    if config_file.exists() {
        println!("  Config exists: {}", config_file.display());
    } else {
        if let Some(parent) = config_file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&config_file, AppConfig::default_toml())?;
        println!("✅ Created {}", config_file.display());
    }

    let config = load_config(Some(&config_file))?;
    let paths = &config.paths;

    seed(&paths.rules_path(), SEED_RULES)?;
    seed(&paths.lenses_path(), SEED_LENSES)?;
    seed(&paths.budget_path(), SEED_BUDGET)?;

    seed(&paths.memory_path(), SEED_PERSONALITY)?;

    let templates = PromptTemplates::builtin();
    let prompts = paths.prompts_path();
    seed(&prompts.join(NEWSLETTER_TEMPLATE_FILE), &templates.newsletter)?;
    seed(&prompts.join(SOCIAL_TEMPLATE_FILE), &templates.social)?;

    std::fs::create_dir_all(paths.output_path())?;
    std::fs::create_dir_all(paths.backups_path())?;

    println!("\n📝 Next steps:");
    println!("   1. Set ZABAL_API_KEY (or GROQ_API_KEY) or edit {}", config_file.display());
    println!("   2. Add voice examples: zabal memory add-example <title> <content>");
    println!("   3. Run: zabal newsletter \"what happened today\"\n");

    Ok(())
}

fn seed(path: &Path, content: &str) -> CmdResult {
    if path.exists() {
        println!("  Exists: {}", path.display());
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    tracing::debug!(path = %path.display(), bytes = content.len(), "Seeded document");
    println!("✅ Created {}", path.display());
    Ok(())
}

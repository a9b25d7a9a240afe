//! `zabal newsletter`: Generate today's newsletter entry.

use super::{CmdResult, NewsletterArgs, build_workflow, load_config, print_result};
use std::path::Path;

pub async fn run(config_path: Option<&Path>, args: NewsletterArgs) -> CmdResult {
    let config = load_config(config_path)?;
    let request = args.into_request()?;
    if request.daily_input.trim().is_empty() {
        return Err("Daily input is required".into());
    }

    let workflow = build_workflow(&config)?;
    println!("📝 Generating newsletter with {}...", workflow.settings().model);

    let result = workflow.generate_newsletter(&request).await?;
    print_result("Newsletter", &result);

    Ok(())
}

//! `zabal full`: Newsletter, then social posts cut from it.

use super::{CmdResult, NewsletterArgs, build_workflow, load_config, print_result};
use std::path::Path;

pub async fn run(
    config_path: Option<&Path>,
    args: NewsletterArgs,
    link: Option<String>,
    has_video: bool,
) -> CmdResult {
    let config = load_config(config_path)?;
    let request = args.into_request()?;
    if request.daily_input.trim().is_empty() {
        return Err("Daily input is required".into());
    }

    let workflow = build_workflow(&config)?;
    let (newsletter, social) = workflow.generate_full(&request, link, has_video).await?;

    print_result("Newsletter", &newsletter);
    print_result("Social", &social);

    Ok(())
}

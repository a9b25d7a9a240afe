//! `zabal social`: Generate social posts from a newsletter.

use super::{CmdResult, build_workflow, load_config, print_result, read_stdin};
use std::path::{Path, PathBuf};
use zabal_workflow::SocialRequest;

pub async fn run(
    config_path: Option<&Path>,
    file: Option<PathBuf>,
    link: Option<String>,
    has_video: bool,
) -> CmdResult {
    let config = load_config(config_path)?;
    let newsletter_content = match file {
        Some(path) => std::fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read {}: {e}", path.display()))?,
        None => read_stdin()?,
    };
    if newsletter_content.trim().is_empty() {
        return Err("Newsletter content is required".into());
    }

    let workflow = build_workflow(&config)?;
    let result = workflow
        .generate_social(&SocialRequest {
            newsletter_content,
            link,
            has_video,
        })
        .await?;
    print_result("Social", &result);

    Ok(())
}

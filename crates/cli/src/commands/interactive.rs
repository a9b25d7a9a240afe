//! `zabal interactive`: Prompt-driven newsletter and social generation.

use super::{CmdResult, build_workflow, load_config, print_result};
use dialoguer::{Confirm, Input, Select};
use std::io::BufRead;
use std::path::Path;
use zabal_workflow::{NewsletterRequest, SocialRequest};

/// A line holding only this ends a multi-line answer.
const END_OF_BLOCK: &str = ".";

const WORKFLOWS: [&str; 3] = ["newsletter", "social", "both"];

pub async fn run(config_path: Option<&Path>) -> CmdResult {
    let config = load_config(config_path)?;
    let workflow = build_workflow(&config)?;

    println!("\n🌀 Year of the ZABAL: Content Generator\n");

    let choice = Select::new()
        .with_prompt("What would you like to generate?")
        .items(&WORKFLOWS)
        .default(2)
        .interact()?;
    let wants_newsletter = choice != 1;
    let wants_social = choice != 0;

    let mut newsletter_text = None;
    if wants_newsletter {
        let daily_input = prompt_block("Enter your daily input")?;
        if daily_input.trim().is_empty() {
            return Err("Daily input is required".into());
        }

        let mut request = NewsletterRequest::new(daily_input);
        if Confirm::new()
            .with_prompt("Do you have a You Are a Badass quote/reflection?")
            .default(false)
            .interact()?
        {
            request.quote = Some(prompt_block("Enter the quote")?);
        }

        println!("\n📝 Generating newsletter...");
        let result = workflow.generate_newsletter(&request).await?;
        print_result("Newsletter", &result);
        newsletter_text = Some(result.text().to_string());
    }

    if wants_social {
        let newsletter_content = match newsletter_text {
            Some(text) => text,
            None => prompt_newsletter_source()?,
        };
        if newsletter_content.trim().is_empty() {
            return Err("Newsletter content is required".into());
        }

        let link = if Confirm::new()
            .with_prompt("Do you have a newsletter link?")
            .default(false)
            .interact()?
        {
            Some(Input::<String>::new().with_prompt("Newsletter link").interact_text()?)
        } else {
            None
        };
        let has_video = Confirm::new()
            .with_prompt("Does this include video content?")
            .default(false)
            .interact()?;

        println!("\n📣 Generating social content...");
        let result = workflow
            .generate_social(&SocialRequest {
                newsletter_content,
                link,
                has_video,
            })
            .await?;
        print_result("Social", &result);
    }

    Ok(())
}

fn prompt_newsletter_source() -> Result<String, Box<dyn std::error::Error>> {
    let source = Select::new()
        .with_prompt("Newsletter source")
        .items(&["file", "paste"])
        .default(0)
        .interact()?;
    if source == 0 {
        let path: String = Input::new().with_prompt("Newsletter file path").interact_text()?;
        return std::fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read {path}: {e}").into());
    }
    prompt_block("Paste the newsletter")
}

fn prompt_block(label: &str) -> Result<String, Box<dyn std::error::Error>> {
    println!("{label} (finish with a line containing only '{END_OF_BLOCK}'):");
    Ok(read_block(std::io::stdin().lock())?)
}

/// Lines up to the end-of-block marker or end of input, joined with `\n`.
fn read_block(reader: impl BufRead) -> std::io::Result<String> {
    let mut lines = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim_end() == END_OF_BLOCK {
            break;
        }
        lines.push(line);
    }
    Ok(lines.join("\n"))
}

//! Base prompt templates.
//!
//! Templates live as plain text files in the prompts directory so they can
//! be edited without a rebuild. A missing file falls back to the built-in
//! text below.

use std::path::Path;
use tracing::{debug, warn};

pub const NEWSLETTER_TEMPLATE_FILE: &str = "newsletter_prompt.txt";
pub const SOCIAL_TEMPLATE_FILE: &str = "social_prompt.txt";

const BUILTIN_NEWSLETTER: &str = "\
You are writing today's entry of the Year of the ZABAL daily newsletter in Zaal's voice.

FORMAT:
- Open with the day number and date on the first line.
- Two to four short paragraphs grounded in the daily input.
- One reflection drawn from a single contemplative lens. Never mix lenses.
- A closing line of exactly one sentence.
- End with the signature on its own line: – BetterCallZaal on behalf of the ZABAL Team

VOICE:
- First person, plain words, specific details over abstractions.
- No marketing language, no hype, no motivational clichés.
- Honest about uncertainty; never invent events that are not in the input.
";

const BUILTIN_SOCIAL: &str = "\
You turn today's ZABAL newsletter into short social posts in Zaal's voice.

RULES:
- Every post starts with ZM.
- No emojis. No hashtags.
- One idea per post, taken from the newsletter. Do not add new claims.
- If a newsletter link is given, include it once at the end of the last post.
- If video content is available, add one short caption suitable for TikTok/YouTube.
";

/// The system-prompt bases for each content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplates {
    pub newsletter: String,
    pub social: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PromptTemplates {
    pub fn builtin() -> Self {
        Self {
            newsletter: BUILTIN_NEWSLETTER.to_string(),
            social: BUILTIN_SOCIAL.to_string(),
        }
    }

    /// Load both templates from `dir`, falling back per file.
    pub fn load(dir: &Path) -> Self {
        Self {
            newsletter: load_or(dir, NEWSLETTER_TEMPLATE_FILE, BUILTIN_NEWSLETTER),
            social: load_or(dir, SOCIAL_TEMPLATE_FILE, BUILTIN_SOCIAL),
        }
    }
}

fn load_or(dir: &Path, file: &str, fallback: &str) -> String {
    let path = dir.join(file);
    match std::fs::read_to_string(&path) {
        Ok(content) if !content.trim().is_empty() => {
            debug!(path = %path.display(), "Loaded prompt template");
            content
        }
        Ok(_) => {
            warn!(path = %path.display(), "Prompt template is empty, using built-in");
            fallback.to_string()
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => fallback.to_string(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read prompt template, using built-in");
            fallback.to_string()
        }
    }
}

//! Evidence-based persona memory updates.
//!
//! The updater sends the current memory and a batch of writing samples to
//! the generation engine, asks for a JSON voice analysis, merges it with
//! [`apply_analysis`] and saves the result only if the safety checks pass.
//! A timestamped backup is written before anything else unless this is a
//! dry run.

use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use zabal_core::diagnostics::{Diagnostics, Verbosity};
use zabal_core::error::{MemoryError, ProviderError};
use zabal_core::provider::{Provider, ProviderRequest};
use zabal_memory::{MemoryAnalysis, PersonaMemory, PersonaMemoryStore, apply_analysis, safety_issues};

const ANALYST_SYSTEM_PROMPT: &str = "You are a precise voice analyst. Extract patterns, never invent.";
const ANALYSIS_TEMPERATURE: f32 = 0.3;
const ANALYSIS_MAX_TOKENS: u32 = 3000;

#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    #[error("No writing samples provided")]
    NoSamples,

    #[error("Analysis failed: {0}")]
    Generation(#[from] ProviderError),

    #[error("Analysis was not valid JSON: {0}")]
    Parse(String),

    #[error("Safety checks failed: {}", .0.join("; "))]
    SafetyChecksFailed(Vec<String>),

    #[error(transparent)]
    Memory(#[from] MemoryError),
}

/// What an update did (or, on a dry run, would do).
#[derive(Debug, Clone, Serialize)]
pub struct UpdateReport {
    pub changes: Vec<String>,
    pub updated: PersonaMemory,
    pub reasoning: String,
    pub voice_patterns_found: Vec<String>,
    /// Safety problems found on a dry run; a real run fails instead
    pub safety_issues: Vec<String>,
    pub backup_path: Option<PathBuf>,
    pub saved: bool,
}

pub struct ContextUpdater {
    store: PersonaMemoryStore,
    provider: Arc<dyn Provider>,
    model: String,
    backups_dir: PathBuf,
    diagnostics: Diagnostics,
}

impl ContextUpdater {
    pub fn new(
        store: PersonaMemoryStore,
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        backups_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            provider,
            model: model.into(),
            backups_dir: backups_dir.into(),
            diagnostics: Diagnostics::silent(),
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub async fn update(
        &self,
        samples: &[String],
        feedback: Option<&str>,
        dry_run: bool,
    ) -> Result<UpdateReport, UpdateError> {
        let samples: Vec<&str> = samples
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();
        if samples.is_empty() {
            return Err(UpdateError::NoSamples);
        }

        let backup_path = if dry_run {
            None
        } else {
            let path = self.store.backup(&self.backups_dir)?;
            info!(path = %path.display(), "Backed up persona memory");
            Some(path)
        };

        let current = self.store.load();
        let analysis = self.analyze(&current, &samples, feedback).await?;
        let (updated, changes) = apply_analysis(&current, &analysis);

        let issues = safety_issues(&updated);
        if !issues.is_empty() {
            warn!(issues = ?issues, dry_run, "Memory update failed safety checks");
            if !dry_run {
                return Err(UpdateError::SafetyChecksFailed(issues));
            }
        }

        let saved = if dry_run {
            false
        } else {
            self.store.save(&updated)?;
            info!(changes = changes.len(), "Persona memory updated");
            true
        };

        Ok(UpdateReport {
            changes,
            updated,
            reasoning: analysis.reasoning,
            voice_patterns_found: analysis.voice_patterns_found,
            safety_issues: issues,
            backup_path,
            saved,
        })
    }

    async fn analyze(
        &self,
        current: &PersonaMemory,
        samples: &[&str],
        feedback: Option<&str>,
    ) -> Result<MemoryAnalysis, UpdateError> {
        let memory_json =
            serde_json::to_string_pretty(current).map_err(|e| MemoryError::Encode(e.to_string()))?;
        let prompt = analysis_prompt(&memory_json, samples, feedback);
        self.diagnostics.log("ANALYSIS PROMPT", &prompt, Verbosity::Trace);

        let request = ProviderRequest::from_prompt(&self.model, ANALYST_SYSTEM_PROMPT, prompt)
            .with_temperature(ANALYSIS_TEMPERATURE)
            .with_max_tokens(ANALYSIS_MAX_TOKENS);
        let response = self.provider.complete(request).await?;

        self.diagnostics.log("ANALYSIS", &response.message.content, Verbosity::Verbose);
        parse_analysis(&response.message.content)
    }
}

/// The user turn asking for a voice analysis.
pub fn analysis_prompt(memory_json: &str, samples: &[&str], feedback: Option<&str>) -> String {
    let feedback = feedback
        .filter(|f| !f.trim().is_empty())
        .map(|f| format!("ZAAL'S FEEDBACK: {f}"))
        .unwrap_or_default();

    format!(
        r#"You are the ZABAL Context Updater. Analyze the provided writing samples and current personality memory.

CURRENT MEMORY:
{memory_json}

WRITING SAMPLES TO ANALYZE:
{samples}

{feedback}

TASK:
Extract voice patterns, identify what's working, and suggest minimal high-signal updates.

HARD RULES:
- NO marketing language
- NO motivational clichés
- NO contradictions with existing voice examples
- MINIMAL edits only (high signal)
- Evidence-based only

OUTPUT FORMAT (JSON):
{{
  "voice_patterns_found": ["pattern 1", "pattern 2"],
  "new_voice_examples": [
    {{"title": "...", "content": "...", "why": "..."}}
  ],
  "new_voice_donts": ["phrase 1", "phrase 2"],
  "new_style_notes": ["note 1", "note 2"],
  "context_updates": ["update 1", "update 2"],
  "current_state": {{
    "phase": "...",
    "energy": "...",
    "focus": ["...", "...", "..."],
    "avoid_this_week": ["...", "..."]
  }},
  "remove_weak_examples": [0, 2],
  "reasoning": "One paragraph explaining why these changes help"
}}

Be ruthless about quality. Only suggest additions that are unmistakably Zaal's voice."#,
        samples = samples.join("\n"),
    )
}

/// Parse the engine's reply, tolerating a fenced code block around the JSON.
pub fn parse_analysis(reply: &str) -> Result<MemoryAnalysis, UpdateError> {
    let mut body = reply.trim();
    if let Some(rest) = body.strip_prefix("```") {
        body = rest.strip_prefix("json").unwrap_or(rest);
        body = body.strip_suffix("```").unwrap_or(body);
    }
    serde_json::from_str(body.trim()).map_err(|e| UpdateError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use zabal_core::message::Message;
    use zabal_core::provider::ProviderResponse;

    struct CannedAnalyst {
        reply: String,
        seen: Mutex<Vec<ProviderRequest>>,
    }

    impl CannedAnalyst {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Provider for CannedAnalyst {
        fn name(&self) -> &str {
            "canned"
        }

        async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            self.seen.lock().unwrap().push(request);
            Ok(ProviderResponse {
                message: Message::assistant(self.reply.clone()),
                usage: None,
                model: "canned".into(),
            })
        }
    }

    fn setup(reply: &str) -> (tempfile::TempDir, Arc<CannedAnalyst>, ContextUpdater) {
        let dir = tempfile::tempdir().unwrap();
        let store = PersonaMemoryStore::new(dir.path().join("memory/personality.json"));
        store.add_voice_example("Old", "An older example.").unwrap();
        store.add_style_note("Short sentences.").unwrap();

        let provider = CannedAnalyst::new(reply);
        let updater = ContextUpdater::new(
            store,
            provider.clone(),
            "analysis-model",
            dir.path().join("memory/backups"),
        );
        (dir, provider, updater)
    }

    const GOOD_REPLY: &str = r#"```json
{
  "voice_patterns_found": ["short declaratives"],
  "new_voice_examples": [{"title": "Ship", "content": "Shipped it. Moving on.", "why": "terse"}],
  "new_voice_donts": ["crush it"],
  "new_style_notes": ["Short sentences.", "Name the day."],
  "context_updates": ["Building in public"],
  "remove_weak_examples": [0],
  "reasoning": "Tighter voice."
}
```"#;

    #[tokio::test]
    async fn update_backs_up_applies_and_saves() {
        let (dir, provider, updater) = setup(GOOD_REPLY);

        let report = updater
            .update(&["Shipped it. Moving on.".to_string()], Some("Too formal lately"), false)
            .await
            .unwrap();

        assert!(report.saved);
        assert!(report.backup_path.as_ref().unwrap().exists());
        assert_eq!(report.reasoning, "Tighter voice.");
        assert_eq!(report.updated.voice_examples.len(), 1);
        assert_eq!(report.updated.voice_examples[0].title, "Ship");
        assert_eq!(report.updated.style_notes, ["Short sentences.", "Name the day."]);
        assert!(report.changes.iter().any(|c| c == "Removed weak example: Old"));

        let stored = PersonaMemoryStore::new(dir.path().join("memory/personality.json")).load();
        assert_eq!(stored, report.updated);

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen[0].model, "analysis-model");
        assert_eq!(seen[0].max_tokens, Some(ANALYSIS_MAX_TOKENS));
        assert_eq!(seen[0].messages[0].content, ANALYST_SYSTEM_PROMPT);
        assert!(seen[0].messages[1].content.contains("ZAAL'S FEEDBACK: Too formal lately"));
        assert!(seen[0].messages[1].content.contains("\"An older example.\""));
    }

    #[tokio::test]
    async fn dry_run_writes_nothing() {
        let (dir, _provider, updater) = setup(GOOD_REPLY);
        let before = PersonaMemoryStore::new(dir.path().join("memory/personality.json")).load();

        let report = updater.update(&["sample".to_string()], None, true).await.unwrap();

        assert!(!report.saved);
        assert!(report.backup_path.is_none());
        assert!(!dir.path().join("memory/backups").exists());
        let after = PersonaMemoryStore::new(dir.path().join("memory/personality.json")).load();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn marketing_language_blocks_save() {
        let reply = r#"{"new_voice_examples": [{"title": "Hype", "content": "We leverage synergy."}]}"#;
        let (dir, _provider, updater) = setup(reply);

        let err = updater.update(&["sample".to_string()], None, false).await.unwrap_err();
        match err {
            UpdateError::SafetyChecksFailed(issues) => {
                assert_eq!(issues, ["Marketing language detected in: Hype"]);
            }
            other => panic!("unexpected error: {other}"),
        }

        let stored = PersonaMemoryStore::new(dir.path().join("memory/personality.json")).load();
        assert_eq!(stored.voice_examples.len(), 1);
        assert_eq!(stored.voice_examples[0].title, "Old");
    }

    #[tokio::test]
    async fn dry_run_reports_safety_issues() {
        let reply = r#"{"new_voice_examples": [{"title": "Hype", "content": "Truly revolutionary."}]}"#;
        let (_dir, _provider, updater) = setup(reply);

        let report = updater.update(&["sample".to_string()], None, true).await.unwrap();
        assert_eq!(report.safety_issues.len(), 1);
        assert!(!report.saved);
    }

    #[tokio::test]
    async fn blank_samples_rejected() {
        let (_dir, provider, updater) = setup(GOOD_REPLY);
        let err = updater.update(&["  ".to_string()], None, false).await.unwrap_err();
        assert!(matches!(err, UpdateError::NoSamples));
        assert!(provider.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn non_json_reply_is_parse_error() {
        assert!(matches!(
            parse_analysis("Here are my thoughts..."),
            Err(UpdateError::Parse(_))
        ));
        assert!(parse_analysis("```\n{}\n```").is_ok());
    }

    #[test]
    fn prompt_omits_empty_feedback() {
        let prompt = analysis_prompt("{}", &["one", "two"], Some(" "));
        assert!(!prompt.contains("ZAAL'S FEEDBACK"));
        assert!(prompt.contains("WRITING SAMPLES TO ANALYZE:\none\ntwo"));
    }
}

//! Newsletter and social generation.
//!
//! Newsletter flow:
//!
//! ```text
//! assemble ─▶ enforce_budget ─▶ provider.complete ─▶ validate ─▶ archive
//! ```
//!
//! Social posts skip assembly: the social template is the whole system
//! prompt and the newsletter text rides in the user message. Provider
//! failures are returned as-is; nothing here retries.

use crate::archive::{OutputArchive, SaveLocation};
use crate::calendar::DayCounter;
use crate::prompts::PromptTemplates;
use crate::WorkflowError;
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use zabal_config::{AppConfig, BudgetConfig, EditorialRules, LensRegistry};
use zabal_constitution::{ConstitutionChecker, Issue};
use zabal_core::artifact::{ContentType, GeneratedArtifact};
use zabal_core::diagnostics::{Diagnostics, Verbosity};
use zabal_core::provider::{Provider, ProviderRequest};
use zabal_lens::LensSelector;
use zabal_memory::PersonaMemoryStore;
use zabal_prompt::{AssemblyRequest, BudgetStatus, PromptAssembler, PrunedItem, VoiceParameters};

// ── Requests ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewsletterRequest {
    pub daily_input: String,
    /// "You Are a Badass" quote or reflection to work in
    #[serde(default)]
    pub quote: Option<String>,
    #[serde(default)]
    pub lens_override: Option<String>,
    #[serde(default)]
    pub calendar_key: Option<String>,
    #[serde(default)]
    pub calendar_text: Option<String>,
    #[serde(default)]
    pub editing_instructions: Option<String>,
    #[serde(default)]
    pub voice_parameters: Option<VoiceParameters>,
    /// Entry date; today when absent
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

impl NewsletterRequest {
    pub fn new(daily_input: impl Into<String>) -> Self {
        Self {
            daily_input: daily_input.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SocialRequest {
    pub newsletter_content: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub has_video: bool,
}

// ── Result ────────────────────────────────────────────────────────────────

/// A validated piece of generated text plus how it was produced.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationResult {
    #[serde(flatten)]
    pub artifact: GeneratedArtifact,
    pub day_number: Option<i64>,
    pub date: String,
    pub remaining_issues: Vec<Issue>,
    /// Whether auto-fix changed the text
    pub auto_fixed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lens_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lens_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_status: Option<BudgetStatus>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pruned: Vec<PrunedItem>,
    pub saved: SaveLocation,
}

impl GenerationResult {
    pub fn text(&self) -> &str {
        &self.artifact.text
    }

    pub fn is_clean(&self) -> bool {
        self.remaining_issues.is_empty()
    }
}

// ── Settings ──────────────────────────────────────────────────────────────

/// Generation-engine call parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub auto_fix: bool,
}

impl GenerationSettings {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: 0.7,
            max_tokens: 2000,
            auto_fix: true,
        }
    }

    pub fn from_config(config: &AppConfig, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: config.default_temperature,
            max_tokens: config.default_max_tokens,
            auto_fix: config.generation.auto_fix,
        }
    }
}

// ── Workflow ──────────────────────────────────────────────────────────────

pub struct GenerationWorkflow {
    assembler: PromptAssembler,
    checker: ConstitutionChecker,
    provider: Arc<dyn Provider>,
    settings: GenerationSettings,
    templates: PromptTemplates,
    days: DayCounter,
    archive: Option<OutputArchive>,
    diagnostics: Diagnostics,
}

impl GenerationWorkflow {
    pub fn new(
        assembler: PromptAssembler,
        checker: ConstitutionChecker,
        provider: Arc<dyn Provider>,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            assembler,
            checker,
            provider,
            settings,
            templates: PromptTemplates::builtin(),
            days: DayCounter::default(),
            archive: None,
            diagnostics: Diagnostics::silent(),
        }
    }

    /// Wire the whole pipeline from application config.
    ///
    /// Editorial rules and an invalid budget fail fast; lenses and persona
    /// memory degrade to empty documents.
    pub fn from_config(
        config: &AppConfig,
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
    ) -> Result<Self, WorkflowError> {
        let paths = &config.paths;
        let diagnostics = config.logging.diagnostics();

        let rules = EditorialRules::load(&paths.rules_path())?;
        let budget = BudgetConfig::load(&paths.budget_path())?;
        let lenses = LensRegistry::load(&paths.lenses_path());

        let store = PersonaMemoryStore::new(paths.memory_path()).with_diagnostics(diagnostics.clone());
        let selector = LensSelector::new(Arc::new(lenses)).with_diagnostics(diagnostics.clone());
        let assembler = PromptAssembler::new(store, selector, Arc::new(budget))
            .with_diagnostics(diagnostics.clone());
        let checker = ConstitutionChecker::new(Arc::new(rules)).with_diagnostics(diagnostics.clone());

        Ok(Self::new(
            assembler,
            checker,
            provider,
            GenerationSettings::from_config(config, model),
        )
        .with_templates(PromptTemplates::load(&paths.prompts_path()))
        .with_day_counter(DayCounter::new(config.generation.day_epoch))
        .with_archive(OutputArchive::new(paths.output_path()))
        .with_diagnostics(diagnostics))
    }

    pub fn with_templates(mut self, templates: PromptTemplates) -> Self {
        self.templates = templates;
        self
    }

    pub fn with_day_counter(mut self, days: DayCounter) -> Self {
        self.days = days;
        self
    }

    pub fn with_archive(mut self, archive: OutputArchive) -> Self {
        self.archive = Some(archive);
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn assembler(&self) -> &PromptAssembler {
        &self.assembler
    }

    pub fn checker(&self) -> &ConstitutionChecker {
        &self.checker
    }

    pub fn archive(&self) -> Option<&OutputArchive> {
        self.archive.as_ref()
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    /// Assemble the newsletter system prompt and hold it to budget without
    /// calling the provider.
    pub fn preview_newsletter_prompt(&self, request: &NewsletterRequest) -> zabal_prompt::BudgetOutcome {
        let assembly_request = self.assembly_request(request);
        let assembled = self.assembler.assemble(&assembly_request);
        self.assembler.enforce_budget(&assembly_request, &assembled)
    }

    pub async fn generate_newsletter(
        &self,
        request: &NewsletterRequest,
    ) -> Result<GenerationResult, WorkflowError> {
        let date = request.date.unwrap_or_else(|| Local::now().date_naive());
        let day_number = self.days.day_number(date);
        let date_stamp = self.days.date_stamp(date);

        let assembly_request = self.assembly_request(request);
        let assembled = self.assembler.assemble(&assembly_request);
        let lens = assembled.lens.clone();
        let budget = self.assembler.enforce_budget(&assembly_request, &assembled);

        if budget.status.is_warning() {
            warn!(
                status = ?budget.status,
                chars = budget.final_chars,
                "Generating with an oversized prompt"
            );
        }

        let user_message = newsletter_user_message(
            &date_stamp,
            day_number,
            &request.daily_input,
            request.quote.as_deref(),
        );
        let text = self.complete(budget.prompt, user_message).await?;

        let report = self.checker.validate(&text, ContentType::Newsletter, self.settings.auto_fix);
        let saved = match &self.archive {
            Some(archive) => archive.save_newsletter(&report.text, day_number, date),
            None => SaveLocation::NotSaved,
        };

        info!(
            day = day_number,
            lens = %lens.lens_id,
            issues = report.remaining_issues.len(),
            auto_fixed = report.was_modified,
            saved = %saved,
            "Newsletter generated"
        );

        Ok(GenerationResult {
            artifact: GeneratedArtifact::new(ContentType::Newsletter, report.text),
            day_number: Some(day_number),
            date: date_stamp,
            remaining_issues: report.remaining_issues,
            auto_fixed: report.was_modified,
            lens_id: Some(lens.lens_id),
            lens_reason: Some(lens.reason),
            budget_status: Some(budget.status),
            pruned: budget.pruned,
            saved,
        })
    }

    pub async fn generate_social(&self, request: &SocialRequest) -> Result<GenerationResult, WorkflowError> {
        let now = Local::now().naive_local();
        let user_message = social_user_message(
            &request.newsletter_content,
            request.link.as_deref(),
            request.has_video,
        );
        let text = self.complete(self.templates.social.clone(), user_message).await?;

        let report = self.checker.validate(&text, ContentType::Social, self.settings.auto_fix);
        let saved = match &self.archive {
            Some(archive) => archive.save_social(&report.text, now),
            None => SaveLocation::NotSaved,
        };

        info!(
            issues = report.remaining_issues.len(),
            auto_fixed = report.was_modified,
            saved = %saved,
            "Social content generated"
        );

        Ok(GenerationResult {
            artifact: GeneratedArtifact::new(ContentType::Social, report.text),
            day_number: None,
            date: self.days.date_stamp(now.date()),
            remaining_issues: report.remaining_issues,
            auto_fixed: report.was_modified,
            lens_id: None,
            lens_reason: None,
            budget_status: None,
            pruned: Vec::new(),
            saved,
        })
    }

    /// Newsletter first, then social posts cut from the final newsletter text.
    pub async fn generate_full(
        &self,
        request: &NewsletterRequest,
        link: Option<String>,
        has_video: bool,
    ) -> Result<(GenerationResult, GenerationResult), WorkflowError> {
        let newsletter = self.generate_newsletter(request).await?;
        let social = self
            .generate_social(&SocialRequest {
                newsletter_content: newsletter.text().to_string(),
                link,
                has_video,
            })
            .await?;
        Ok((newsletter, social))
    }

    fn assembly_request(&self, request: &NewsletterRequest) -> AssemblyRequest {
        AssemblyRequest::new(self.templates.newsletter.clone(), request.daily_input.clone())
            .with_lens_override(request.lens_override.clone())
            .with_calendar(request.calendar_key.clone(), request.calendar_text.clone())
            .with_editing_instructions(request.editing_instructions.clone())
            .with_voice_parameters(request.voice_parameters)
    }

    async fn complete(&self, system: String, user: String) -> Result<String, WorkflowError> {
        self.diagnostics.log("USER MESSAGE", &user, Verbosity::Verbose);

        let request = ProviderRequest::from_prompt(&self.settings.model, system, user)
            .with_temperature(self.settings.temperature)
            .with_max_tokens(self.settings.max_tokens);
        let response = self.provider.complete(request).await?;

        self.diagnostics.log(
            "GENERATED",
            &response.message.content,
            Verbosity::Trace,
        );
        Ok(response.message.content)
    }
}

/// The user turn for a newsletter request.
pub fn newsletter_user_message(date_stamp: &str, day_number: i64, daily_input: &str, quote: Option<&str>) -> String {
    let mut message = format!("Today is {date_stamp} (Day {day_number}).\n\n");
    message.push_str(&format!("Daily Input:\n{daily_input}\n\n"));
    if let Some(quote) = quote.filter(|q| !q.trim().is_empty()) {
        message.push_str(&format!("You Are a Badass Quote/Reflection:\n{quote}\n\n"));
    }
    message.push_str(
        "Generate today's Year of the ZABAL newsletter entry following the exact format and voice guidelines.",
    );
    message
}

/// The user turn for a social request.
pub fn social_user_message(newsletter_content: &str, link: Option<&str>, has_video: bool) -> String {
    let mut message = format!("Newsletter Content:\n{newsletter_content}");
    if let Some(link) = link.filter(|l| !l.trim().is_empty()) {
        message.push_str(&format!("\n\nNewsletter Link: {link}"));
    }
    if has_video {
        message.push_str("\n\nNote: Video content available for TikTok/YouTube");
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use zabal_config::rules::{NewsletterConstraints, OutputConstraints, SocialConstraints};
    use zabal_core::error::ProviderError;
    use zabal_core::message::{Message, Role};
    use zabal_core::provider::ProviderResponse;

    /// Returns canned replies in order and records every request.
    struct ScriptedProvider {
        replies: Mutex<Vec<Result<String, ProviderError>>>,
        seen: Mutex<Vec<ProviderRequest>>,
    }

    impl ScriptedProvider {
        fn new(replies: Vec<Result<String, ProviderError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<ProviderRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            self.seen.lock().unwrap().push(request);
            let reply = self.replies.lock().unwrap().remove(0)?;
            Ok(ProviderResponse {
                message: Message::assistant(reply),
                usage: None,
                model: "scripted-model".into(),
            })
        }
    }

    const SIGNATURE: &str = "– BetterCallZaal on behalf of the ZABAL Team";

    fn rules() -> EditorialRules {
        EditorialRules {
            hard_bans: vec!["synergy".into()],
            output_constraints: OutputConstraints {
                newsletter: Some(NewsletterConstraints {
                    require_signature: true,
                    ..NewsletterConstraints::default()
                }),
                social: Some(SocialConstraints {
                    require_zm_prefix: true,
                    no_emojis: true,
                    no_hashtags: true,
                    ..SocialConstraints::default()
                }),
            },
        }
    }

    fn workflow(dir: &tempfile::TempDir, provider: Arc<dyn Provider>) -> GenerationWorkflow {
        let lenses = LensRegistry::from_json(
            r#"{
                "personal_observation": {"tone": "plain", "guidance": ["Notice one thing."], "avoid": [], "use_when": []},
                "stoic": {"tone": "steady", "guidance": ["Focus on what you control."], "avoid": [], "use_when": ["setback", "control"]}
            }"#,
        )
        .unwrap();
        let store = PersonaMemoryStore::new(dir.path().join("memory/personality.json"));
        store.add_style_note("Short sentences.").unwrap();

        let assembler = PromptAssembler::new(
            store,
            LensSelector::new(Arc::new(lenses)),
            Arc::new(BudgetConfig::default()),
        );
        let checker = ConstitutionChecker::new(Arc::new(rules()));

        GenerationWorkflow::new(assembler, checker, provider, GenerationSettings::new("test-model"))
            .with_day_counter(DayCounter::new(NaiveDate::from_ymd_opt(2025, 1, 1)))
            .with_archive(OutputArchive::new(dir.path().join("output")))
    }

    #[tokio::test]
    async fn newsletter_pipeline_fixes_and_archives() {
        let dir = tempfile::tempdir().unwrap();
        let provider = ScriptedProvider::new(vec![Ok("Day 10\n\nA setback today.\nThis is it. Really.".into())]);
        let wf = workflow(&dir, provider.clone());

        let mut request = NewsletterRequest::new("A setback I could not control.");
        request.date = NaiveDate::from_ymd_opt(2025, 1, 10);
        request.quote = Some("Keep going.".into());

        let result = wf.generate_newsletter(&request).await.unwrap();

        assert_eq!(result.day_number, Some(10));
        assert_eq!(result.date, "Friday, January 10, 2025");
        assert_eq!(result.lens_id.as_deref(), Some("stoic"));
        assert_eq!(result.lens_reason.as_deref(), Some("matched: setback, control"));
        assert_eq!(result.budget_status, Some(BudgetStatus::WithinTarget));
        assert!(result.auto_fixed);
        assert!(result.is_clean(), "{:?}", result.remaining_issues);
        assert!(result.text().contains("This is it.\n"));
        assert!(result.text().ends_with(SIGNATURE));

        let saved = result.saved.path().unwrap();
        assert!(saved.ends_with("newsletter_day_10_20250110.txt"));
        assert_eq!(std::fs::read_to_string(saved).unwrap(), result.text());

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        let system = &requests[0].messages[0];
        let user = &requests[0].messages[1];
        assert_eq!(system.role, Role::System);
        assert!(system.content.contains("=== MINDFUL LENS: stoic ==="));
        assert!(system.content.contains("Short sentences."));
        assert!(user.content.starts_with("Today is Friday, January 10, 2025 (Day 10)."));
        assert!(user.content.contains("You Are a Badass Quote/Reflection:\nKeep going."));
        assert_eq!(requests[0].model, "test-model");
        assert_eq!(requests[0].max_tokens, Some(2000));
    }

    #[tokio::test]
    async fn banned_phrase_survives_as_remaining_issue() {
        let dir = tempfile::tempdir().unwrap();
        let provider = ScriptedProvider::new(vec![Ok(format!("Synergy wins.\n{SIGNATURE}"))]);
        let wf = workflow(&dir, provider);

        let result = wf.generate_newsletter(&NewsletterRequest::new("")).await.unwrap();
        assert_eq!(result.lens_id.as_deref(), Some("personal_observation"));
        assert_eq!(result.remaining_issues, vec![Issue::BannedPhrase("synergy".into())]);
        assert!(!result.auto_fixed);
    }

    #[tokio::test]
    async fn provider_failure_propagates_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let provider = ScriptedProvider::new(vec![Err(ProviderError::RateLimited { retry_after_secs: 5 })]);
        let wf = workflow(&dir, provider.clone());

        let err = wf.generate_newsletter(&NewsletterRequest::new("x")).await.unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Generation(ProviderError::RateLimited { retry_after_secs: 5 })
        ));
        assert_eq!(provider.requests().len(), 1, "no retry");
        assert!(wf.archive().unwrap().list_newsletters().unwrap().is_empty());
    }

    #[tokio::test]
    async fn social_gets_prefix_and_template() {
        let dir = tempfile::tempdir().unwrap();
        let provider = ScriptedProvider::new(vec![Ok("Quiet wins count.".into())]);
        let wf = workflow(&dir, provider.clone());

        let result = wf
            .generate_social(&SocialRequest {
                newsletter_content: "Day 10 body".into(),
                link: Some("https://paragraph.xyz/@zabal/day-10".into()),
                has_video: true,
            })
            .await
            .unwrap();

        assert!(result.text().starts_with("ZM "));
        assert!(result.is_clean());
        assert_eq!(result.day_number, None);
        assert!(result.saved.path().unwrap().starts_with(dir.path().join("output/social")));

        let requests = provider.requests();
        assert_eq!(requests[0].messages[0].content, PromptTemplates::builtin().social);
        assert_eq!(
            requests[0].messages[1].content,
            "Newsletter Content:\nDay 10 body\n\nNewsletter Link: https://paragraph.xyz/@zabal/day-10\n\nNote: Video content available for TikTok/YouTube"
        );
    }

    #[tokio::test]
    async fn full_feeds_final_newsletter_into_social() {
        let dir = tempfile::tempdir().unwrap();
        let provider = ScriptedProvider::new(vec![
            Ok("Day 3 entry.".into()),
            Ok("ZM one idea".into()),
        ]);
        let wf = workflow(&dir, provider.clone());

        let (newsletter, social) = wf
            .generate_full(&NewsletterRequest::new("input"), None, false)
            .await
            .unwrap();

        assert!(newsletter.text().ends_with(SIGNATURE));
        assert_eq!(social.text(), "ZM one idea");
        let requests = provider.requests();
        assert_eq!(
            requests[1].messages[1].content,
            format!("Newsletter Content:\n{}", newsletter.text())
        );
    }

    #[test]
    fn preview_does_not_call_provider() {
        let dir = tempfile::tempdir().unwrap();
        let provider = ScriptedProvider::new(Vec::new());
        let wf = workflow(&dir, provider.clone());

        let mut request = NewsletterRequest::new("hello");
        request.editing_instructions = Some("Shorter.".into());
        let outcome = wf.preview_newsletter_prompt(&request);

        assert!(outcome.prompt.contains("=== EDITING INSTRUCTIONS ===\n"));
        assert_eq!(outcome.status, BudgetStatus::WithinTarget);
        assert!(provider.requests().is_empty());
    }

    #[test]
    fn user_message_without_quote() {
        let msg = newsletter_user_message("Monday, March 02, 2026", 61, "Shipped it.", Some("  "));
        assert_eq!(
            msg,
            "Today is Monday, March 02, 2026 (Day 61).\n\nDaily Input:\nShipped it.\n\n\
             Generate today's Year of the ZABAL newsletter entry following the exact format and voice guidelines."
        );
    }

    #[test]
    fn result_serializes_flat() {
        let result = GenerationResult {
            artifact: GeneratedArtifact::new(ContentType::Newsletter, "text"),
            day_number: Some(1),
            date: "Thursday, January 01, 2026".into(),
            remaining_issues: vec![Issue::MissingSignature],
            auto_fixed: false,
            lens_id: None,
            lens_reason: None,
            budget_status: Some(BudgetStatus::OverTarget),
            pruned: Vec::new(),
            saved: SaveLocation::NotSaved,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["content_type"], "newsletter");
        assert_eq!(json["text"], "text");
        assert_eq!(json["remaining_issues"][0], "MISSING_SIGNATURE");
        assert_eq!(json["budget_status"], "over_target");
        assert_eq!(json["saved"], "Not saved");
        assert!(json.get("lens_id").is_none());
    }
}

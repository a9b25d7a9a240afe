//! # ZABAL Constitution
//!
//! Post-generation editorial checks. The checker evaluates generated text
//! against the loaded [`EditorialRules`] and returns issues as data; it
//! never fails the call. A few issues have deterministic fixes (append the
//! signature, trim the closing line, prepend the social prefix). Banned
//! phrases and lens mixing always need a human or a regeneration.

pub mod issue;

pub use issue::Issue;

use serde::Serialize;
use std::sync::Arc;
use zabal_config::rules::{EditorialRules, NewsletterConstraints, SocialConstraints};
use zabal_core::artifact::ContentType;
use zabal_core::diagnostics::{Diagnostics, Verbosity};

/// Phrases that each signal a distinct contemplative framing.
pub const LENS_INDICATORS: [&str; 6] = [
    "you are a badass",
    "don't sweat",
    "stoic",
    "zen",
    "buddha",
    "marcus aurelius",
];

/// Outcome of [`ConstitutionChecker::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub text: String,
    pub remaining_issues: Vec<Issue>,
    /// Whether auto-fix resolved at least one issue
    pub was_modified: bool,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.remaining_issues.is_empty()
    }
}

pub struct ConstitutionChecker {
    rules: Arc<EditorialRules>,
    diagnostics: Diagnostics,
}

impl ConstitutionChecker {
    pub fn new(rules: Arc<EditorialRules>) -> Self {
        Self {
            rules,
            diagnostics: Diagnostics::silent(),
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn rules(&self) -> &EditorialRules {
        &self.rules
    }

    // Absent constraint blocks fall back to defaults, which only enforce the
    // one-sentence closing line.
    fn newsletter(&self) -> NewsletterConstraints {
        self.rules.output_constraints.newsletter.clone().unwrap_or_default()
    }

    fn social(&self) -> SocialConstraints {
        self.rules.output_constraints.social.clone().unwrap_or_default()
    }

    /// Check `text` and return issues in check order.
    pub fn check(&self, text: &str, content_type: ContentType) -> Vec<Issue> {
        let lower = text.to_lowercase();
        let mut issues: Vec<Issue> = self
            .rules
            .hard_bans
            .iter()
            .filter(|phrase| lower.contains(&phrase.to_lowercase()))
            .map(|phrase| Issue::BannedPhrase(phrase.clone()))
            .collect();

        match content_type {
            ContentType::Newsletter => self.check_newsletter(text, &lower, &mut issues),
            ContentType::Social => self.check_social(text, &mut issues),
        }

        if self.diagnostics.assembly_enabled(Verbosity::Basic) {
            if issues.is_empty() {
                self.diagnostics.log("CONSTITUTION CHECK", "All rules passed", Verbosity::Basic);
            } else {
                self.diagnostics.section("CONSTITUTION CHECK - ISSUES FOUND", Verbosity::Basic);
                for issue in &issues {
                    self.diagnostics.log("ISSUE", &issue.to_string(), Verbosity::Basic);
                }
            }
        }

        issues
    }

    fn check_newsletter(&self, text: &str, lower: &str, issues: &mut Vec<Issue>) {
        let rules = self.newsletter();

        if rules.require_signature && !text.contains(&rules.signature) {
            issues.push(Issue::MissingSignature);
        }

        let lines: Vec<&str> = text.trim().split('\n').collect();
        if let Some(idx) = closing_line_index(&lines, &rules.signature_marker) {
            let sentences = sentence_count(lines[idx]);
            if sentences > rules.closing_line_max_sentences {
                issues.push(Issue::ClosingTooLong(sentences));
            }
        }

        let indicators = LENS_INDICATORS.iter().filter(|m| lower.contains(*m)).count();
        if indicators > 1 {
            issues.push(Issue::MultipleLensesDetected);
        }
    }

    fn check_social(&self, text: &str, issues: &mut Vec<Issue>) {
        let rules = self.social();

        if rules.require_zm_prefix
            && !text
                .trim()
                .to_uppercase()
                .starts_with(&rules.prefix.to_uppercase())
        {
            issues.push(Issue::MissingPrefix);
        }

        // Either flag enables the combined emoji-or-hashtag scan.
        let gated = rules.no_emojis || rules.no_hashtags;
        if gated && (text.chars().any(is_emoji) || text.contains('#')) {
            issues.push(Issue::EmojiOrHashtagFound);
        }
    }

    /// Apply safe fixes for `issues`, in order. Returns the fixed text and
    /// the issues that could not be fixed.
    pub fn auto_fix(&self, text: &str, issues: &[Issue], content_type: ContentType) -> (String, Vec<Issue>) {
        let mut fixed = text.to_string();
        let mut remaining = Vec::new();

        for issue in issues {
            match (issue, content_type) {
                (Issue::MissingSignature, ContentType::Newsletter) => {
                    let signature = self.newsletter().signature;
                    fixed = format!("{}\n\n{signature}", fixed.trim_end());
                    self.diagnostics.log("AUTO-FIX", "Added missing signature", Verbosity::Basic);
                }
                (Issue::ClosingTooLong(_), ContentType::Newsletter) => {
                    match trim_closing_line(&fixed, &self.newsletter().signature_marker) {
                        Some(trimmed) => {
                            fixed = trimmed;
                            self.diagnostics.log("AUTO-FIX", "Trimmed closing line to one sentence", Verbosity::Basic);
                        }
                        None => remaining.push(issue.clone()),
                    }
                }
                (Issue::MissingPrefix, ContentType::Social) => {
                    fixed = format!("{} {}", self.social().prefix, fixed.trim_start());
                    self.diagnostics.log("AUTO-FIX", "Added prefix", Verbosity::Basic);
                }
                _ => {
                    self.diagnostics.log("CANNOT AUTO-FIX", &issue.to_string(), Verbosity::Basic);
                    remaining.push(issue.clone());
                }
            }
        }

        (fixed, remaining)
    }

    /// Check, then optionally auto-fix.
    pub fn validate(&self, text: &str, content_type: ContentType, auto_fix_enabled: bool) -> ValidationReport {
        let issues = self.check(text, content_type);

        if issues.is_empty() || !auto_fix_enabled {
            return ValidationReport {
                text: text.to_string(),
                remaining_issues: issues,
                was_modified: false,
            };
        }

        let (fixed, remaining) = self.auto_fix(text, &issues, content_type);
        let was_modified = remaining.len() < issues.len();
        if !remaining.is_empty() {
            tracing::warn!(
                content_type = %content_type,
                issues = ?remaining.iter().map(ToString::to_string).collect::<Vec<_>>(),
                "Issues remain after auto-fix"
            );
        }

        ValidationReport {
            text: fixed,
            remaining_issues: remaining,
            was_modified,
        }
    }
}

/// Index of the last non-blank line that is not part of the signature.
fn closing_line_index(lines: &[&str], signature_marker: &str) -> Option<usize> {
    lines
        .iter()
        .rposition(|line| !line.trim().is_empty() && !line.contains(signature_marker))
}

fn sentence_count(line: &str) -> usize {
    line.split('.').filter(|s| !s.trim().is_empty()).count()
}

fn trim_closing_line(text: &str, signature_marker: &str) -> Option<String> {
    let mut lines: Vec<String> = text.trim().split('\n').map(str::to_string).collect();
    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    let idx = closing_line_index(&refs, signature_marker)?;
    let first = lines[idx].split('.').find(|s| !s.trim().is_empty())?.trim().to_string();
    lines[idx] = format!("{first}.");
    Some(lines.join("\n"))
}

fn is_emoji(c: char) -> bool {
    ('\u{1F300}'..='\u{1FAFF}').contains(&c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use zabal_config::rules::{DEFAULT_SIGNATURE, OutputConstraints};

    fn newsletter_rules(bans: &[&str]) -> EditorialRules {
        EditorialRules {
            hard_bans: bans.iter().map(|b| b.to_string()).collect(),
            output_constraints: OutputConstraints {
                newsletter: Some(NewsletterConstraints {
                    require_signature: true,
                    closing_line_max_sentences: 1,
                    ..NewsletterConstraints::default()
                }),
                social: None,
            },
        }
    }

    fn social_rules(prefix: bool, emojis: bool, hashtags: bool) -> EditorialRules {
        EditorialRules {
            hard_bans: vec![],
            output_constraints: OutputConstraints {
                newsletter: None,
                social: Some(SocialConstraints {
                    require_zm_prefix: prefix,
                    no_emojis: emojis,
                    no_hashtags: hashtags,
                    ..SocialConstraints::default()
                }),
            },
        }
    }

    fn checker(rules: EditorialRules) -> ConstitutionChecker {
        ConstitutionChecker::new(Arc::new(rules))
    }

    fn codes(issues: &[Issue]) -> Vec<String> {
        issues.iter().map(ToString::to_string).collect()
    }

    fn signed(body: &str) -> String {
        format!("{body}\n\n{DEFAULT_SIGNATURE}")
    }

    #[test]
    fn clean_newsletter_passes() {
        let c = checker(newsletter_rules(&["synergy"]));
        let text = signed("Day 12.\n\nWalked to the studio.\n\nKeep going.");
        assert!(c.check(&text, ContentType::Newsletter).is_empty());
    }

    #[test]
    fn banned_phrase_any_case_once_per_phrase() {
        let c = checker(newsletter_rules(&["synergy", "circle back"]));
        let text = signed("SYNERGY here, synergy there.\n\nDone.");
        assert_eq!(codes(&c.check(&text, ContentType::Newsletter)), vec!["BANNED_PHRASE:synergy"]);
    }

    #[test]
    fn banned_phrase_survives_auto_fix() {
        let c = checker(newsletter_rules(&["synergy"]));
        let text = "Pure Synergy.";
        let issues = c.check(text, ContentType::Newsletter);
        assert!(issues.contains(&Issue::BannedPhrase("synergy".into())));
        let (fixed, remaining) = c.auto_fix(text, &issues, ContentType::Newsletter);
        assert_eq!(remaining, vec![Issue::BannedPhrase("synergy".into())]);
        assert!(fixed.contains("Synergy"));
    }

    #[test]
    fn missing_signature_fixed() {
        let c = checker(newsletter_rules(&[]));
        let text = "A quiet day.\n\nThat was enough.   \n";
        let issues = c.check(text, ContentType::Newsletter);
        assert_eq!(issues, vec![Issue::MissingSignature]);

        let (fixed, remaining) = c.auto_fix(text, &issues, ContentType::Newsletter);
        assert!(remaining.is_empty());
        assert_eq!(fixed, format!("A quiet day.\n\nThat was enough.\n\n{DEFAULT_SIGNATURE}"));
        assert!(c.check(&fixed, ContentType::Newsletter).is_empty());
    }

    #[test]
    fn closing_line_trimmed_to_first_sentence() {
        let c = checker(newsletter_rules(&[]));
        let text = signed("Long day.\n\nThis is it. Really.");
        let issues = c.check(&text, ContentType::Newsletter);
        assert_eq!(issues, vec![Issue::ClosingTooLong(2)]);

        let (fixed, remaining) = c.auto_fix(&text, &issues, ContentType::Newsletter);
        assert!(remaining.is_empty());
        assert_eq!(fixed, signed("Long day.\n\nThis is it."));
        assert!(c.check(&fixed, ContentType::Newsletter).is_empty());
    }

    #[test]
    fn signature_line_is_not_the_closing_line() {
        let c = checker(newsletter_rules(&[]));
        // The signature line has no periods but must be skipped anyway.
        let text = signed("One. Two. Three.");
        assert_eq!(c.check(&text, ContentType::Newsletter), vec![Issue::ClosingTooLong(3)]);
    }

    #[test]
    fn signature_then_closing_fix_in_order() {
        let c = checker(newsletter_rules(&[]));
        let text = "Body.\n\nThis is it. Really.";
        let issues = c.check(text, ContentType::Newsletter);
        assert_eq!(issues, vec![Issue::MissingSignature, Issue::ClosingTooLong(2)]);
        let report = c.validate(text, ContentType::Newsletter, true);
        assert!(report.is_clean());
        assert!(report.was_modified);
        assert_eq!(report.text, signed("Body.\n\nThis is it."));
    }

    #[test]
    fn multiple_lenses_detected_and_not_fixable() {
        let c = checker(newsletter_rules(&[]));
        let text = signed("A stoic morning, a zen afternoon.");
        let report = c.validate(&text, ContentType::Newsletter, true);
        assert_eq!(report.remaining_issues, vec![Issue::MultipleLensesDetected]);
        assert!(!report.was_modified);
        assert_eq!(report.text, text);
    }

    #[test]
    fn single_lens_marker_is_fine() {
        let c = checker(newsletter_rules(&[]));
        let text = signed("Marcus Aurelius would shrug.");
        assert!(c.check(&text, ContentType::Newsletter).is_empty());
    }

    #[test]
    fn newsletter_defaults_when_block_missing() {
        let c = checker(EditorialRules::default());
        assert!(c.check("No signature here.", ContentType::Newsletter).is_empty());
        assert_eq!(
            c.check("Two. Sentences.", ContentType::Newsletter),
            vec![Issue::ClosingTooLong(2)]
        );
    }

    #[test]
    fn social_prefix_checked_case_insensitively() {
        let c = checker(social_rules(true, false, false));
        assert!(c.check("  zm gm builders", ContentType::Social).is_empty());
        assert_eq!(c.check("gm builders", ContentType::Social), vec![Issue::MissingPrefix]);
    }

    #[test]
    fn social_prefix_fixed() {
        let c = checker(social_rules(true, false, false));
        let report = c.validate("  gm builders", ContentType::Social, true);
        assert_eq!(report.text, "ZM gm builders");
        assert!(report.is_clean());
        assert!(report.was_modified);
    }

    #[test]
    fn either_flag_enables_emoji_and_hashtag_scan() {
        let emoji = "ZM shipped it \u{1F680}";
        let hashtag = "ZM gm #zao";
        for (no_emojis, no_hashtags) in [(true, false), (false, true), (true, true)] {
            let c = checker(social_rules(false, no_emojis, no_hashtags));
            assert_eq!(c.check(emoji, ContentType::Social), vec![Issue::EmojiOrHashtagFound]);
            assert_eq!(c.check(hashtag, ContentType::Social), vec![Issue::EmojiOrHashtagFound]);
        }
    }

    #[test]
    fn emoji_and_hashtag_unchecked_without_flags() {
        let c = checker(social_rules(false, false, false));
        assert!(c.check("ZM shipped it \u{1F680} #zao", ContentType::Social).is_empty());
    }

    #[test]
    fn emoji_issue_not_auto_fixed() {
        let c = checker(social_rules(true, true, true));
        let report = c.validate("gm #zao", ContentType::Social, true);
        assert_eq!(report.text, "ZM gm #zao");
        assert_eq!(report.remaining_issues, vec![Issue::EmojiOrHashtagFound]);
        assert!(report.was_modified);
    }

    #[test]
    fn newsletter_checks_skip_social_text() {
        let c = checker(newsletter_rules(&[]));
        assert!(c.check("gm. gm.", ContentType::Social).is_empty());
    }

    #[test]
    fn validate_without_auto_fix_returns_original() {
        let c = checker(newsletter_rules(&["synergy"]));
        let text = "Synergy wins.";
        let report = c.validate(text, ContentType::Newsletter, false);
        assert_eq!(report.text, text);
        assert_eq!(codes(&report.remaining_issues), vec!["BANNED_PHRASE:synergy", "MISSING_SIGNATURE"]);
        assert!(!report.was_modified);
    }

    #[test]
    fn end_to_end_scenario() {
        let c = checker(newsletter_rules(&["synergy"]));
        let text = "Synergy wins.";
        assert_eq!(
            codes(&c.check(text, ContentType::Newsletter)),
            vec!["BANNED_PHRASE:synergy", "MISSING_SIGNATURE"]
        );
        let report = c.validate(text, ContentType::Newsletter, true);
        assert!(report.text.ends_with(DEFAULT_SIGNATURE));
        assert_eq!(codes(&report.remaining_issues), vec!["BANNED_PHRASE:synergy"]);
        assert!(report.was_modified);
    }
}

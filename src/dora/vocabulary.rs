//! Keyword sets used by deployment detection and failure classification.
//! All entries are lower-case; callers lower-case the text they match.
//!
//! Issue vocabularies match whole words plus a few inflections, so
//! `crashes` counts as `crash` but `author` does not count as `auth`.
//! Commit markers stay plain substrings (`bugfix` is a fix).

use std::sync::OnceLock;

use regex::Regex;

/// Endings accepted after an issue term: `crashes`, `deployed`, `leaking`.
const INFLECTIONS: &str = "s|es|ed|d|ing|ment|ments|ion|ions";

/// A fixed term list with lazily compiled word patterns.
pub struct Vocabulary {
    terms: &'static [&'static str],
    patterns: OnceLock<Vec<(&'static str, Regex)>>,
}

impl Vocabulary {
    pub const fn new(terms: &'static [&'static str]) -> Self {
        Self {
            terms,
            patterns: OnceLock::new(),
        }
    }

    pub fn terms(&self) -> &'static [&'static str] {
        self.terms
    }

    fn patterns(&self) -> &[(&'static str, Regex)] {
        self.patterns.get_or_init(|| {
            self.terms
                .iter()
                .filter_map(|term| {
                    let pattern = format!(r"\b{}(?:{INFLECTIONS})?\b", regex::escape(term));
                    Regex::new(&pattern).ok().map(|re| (*term, re))
                })
                .collect()
        })
    }

    /// Terms that occur in `text` as words.
    pub fn matches_in<'a>(&'a self, text: &'a str) -> impl Iterator<Item = &'static str> + 'a {
        self.patterns()
            .iter()
            .filter(move |(_, re)| re.is_match(text))
            .map(|(term, _)| *term)
    }

    pub fn contains_any(&self, text: &str) -> bool {
        self.patterns().iter().any(|(_, re)| re.is_match(text))
    }

    /// True when one of the label's alphanumeric tokens equals a term, so
    /// `priority: high` and `P1` match but `highlight` and `p10` do not.
    pub fn matches_label(&self, label: &str) -> bool {
        label
            .split(|c: char| !c.is_alphanumeric())
            .any(|token| self.terms.contains(&token))
    }
}

/// Commit message fragments that mark a commit as a deployment.
pub const DEPLOYMENT_COMMIT_MARKERS: &[&str] =
    &["deploy", "release", "production", "hotfix", "emergency"];

/// Commit message fragments that suggest a remediation.
pub const REMEDIATION_MARKERS: &[&str] = &["fix", "revert"];

/// Terms that rule an issue out of failure classification entirely.
pub static EXCLUSION_TERMS: Vocabulary = Vocabulary::new(&[
    "documentation",
    "enhancement",
    "feature",
    "question",
    "discussion",
    "proposal",
    "help wanted",
    "good first issue",
    "wontfix",
    "duplicate",
]);

pub static PRIMARY_INDICATORS: Vocabulary = Vocabulary::new(&[
    "bug",
    "incident",
    "error",
    "crash",
    "failure",
    "outage",
    "hotfix",
    "rollback",
    "broken",
    "regression",
    "exception",
    "defect",
]);

pub static SECONDARY_INDICATORS: Vocabulary = Vocabulary::new(&[
    "auth",
    "permission",
    "injection",
    "race",
    "deadlock",
    "timeout",
    "leak",
    "corrupt",
    "vulnerability",
    "security",
]);

pub static DEPLOYMENT_CONTEXT: Vocabulary = Vocabulary::new(&[
    "deploy",
    "release",
    "production",
    "rollback",
    "rollout",
    "hotfix",
    "after update",
    "after upgrade",
    "new version",
]);

pub static SEVERITY_LABELS: Vocabulary =
    Vocabulary::new(&["critical", "high", "urgent", "blocker", "p0", "p1"]);

pub static SEVERITY_KEYWORDS: Vocabulary =
    Vocabulary::new(&["crash", "outage", "downtime", "fatal", "emergency"]);

/// Whether `text` contains any of `terms` as a plain substring.
pub fn contains_any(text: &str, terms: &[&str]) -> bool {
    terms.iter().any(|term| text.contains(term))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_in_returns_every_hit() {
        let hits: Vec<_> = SEVERITY_KEYWORDS.matches_in("crash after outage").collect();

        assert_eq!(hits, vec!["crash", "outage"]);
    }

    #[test]
    fn test_inflected_words_match() {
        assert!(PRIMARY_INDICATORS.contains_any("the app crashes on start"));
        assert!(DEPLOYMENT_CONTEXT.contains_any("broke once deployed"));
        assert!(SECONDARY_INDICATORS.contains_any("memory leaking in worker"));
    }

    #[test]
    fn test_terms_inside_other_words_do_not_match() {
        let hits: Vec<_> = SECONDARY_INDICATORS
            .matches_in("stack trace in author view")
            .collect();

        assert!(hits.is_empty());
        assert!(!PRIMARY_INDICATORS.contains_any("terror debugger"));
    }

    #[test]
    fn test_multi_word_terms_match() {
        assert!(EXCLUSION_TERMS.contains_any("good first issue"));
        assert!(DEPLOYMENT_CONTEXT.contains_any("broken after upgrade to 2.0"));
    }

    #[test]
    fn test_label_tokens_match_exactly() {
        assert!(SEVERITY_LABELS.matches_label("priority: high"));
        assert!(SEVERITY_LABELS.matches_label("p1"));
        assert!(SEVERITY_LABELS.matches_label("severity/critical"));
        assert!(!SEVERITY_LABELS.matches_label("highlight"));
        assert!(!SEVERITY_LABELS.matches_label("p10"));
    }

    #[test]
    fn test_commit_markers_match_substrings() {
        assert!(contains_any("bugfix for login", REMEDIATION_MARKERS));
        assert!(contains_any("redeploy api", DEPLOYMENT_COMMIT_MARKERS));
    }

    #[test]
    fn test_vocabularies_are_lower_case() {
        for list in [
            EXCLUSION_TERMS.terms(),
            PRIMARY_INDICATORS.terms(),
            SECONDARY_INDICATORS.terms(),
            DEPLOYMENT_CONTEXT.terms(),
            SEVERITY_LABELS.terms(),
            SEVERITY_KEYWORDS.terms(),
            DEPLOYMENT_COMMIT_MARKERS,
            REMEDIATION_MARKERS,
        ] {
            assert!(list.iter().all(|t| t.to_lowercase() == *t));
        }
    }
}

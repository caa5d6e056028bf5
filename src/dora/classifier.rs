//! Heuristic failure classification for issues.
//!
//! Every issue is scored from four independent angles (labels and content,
//! severity, proximity to releases and remediation commits, deployment
//! context) and the sum is compared to the configured failure threshold.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::deployments::{Deployment, DeploymentKind};
use super::vocabulary::{
    contains_any, DEPLOYMENT_CONTEXT, EXCLUSION_TERMS, PRIMARY_INDICATORS,
    REMEDIATION_MARKERS, SECONDARY_INDICATORS, SEVERITY_KEYWORDS, SEVERITY_LABELS,
};
use crate::config::ScoringConfig;
use crate::signals::{Commit, Issue};

const SECONDS_PER_DAY: f64 = 86_400.0;
const BUSY_DISCUSSION_COMMENTS: u32 = 5;
const VERY_BUSY_DISCUSSION_COMMENTS: u32 = 10;
const REMEDIATION_WINDOW_DAYS: f64 = 7.0;

static VERSION_TOKEN: OnceLock<Option<Regex>> = OnceLock::new();

fn version_token_pattern() -> Option<&'static Regex> {
    VERSION_TOKEN
        .get_or_init(|| Regex::new(r"v?\d+\.\d+\.\d+").ok())
        .as_ref()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    VeryHigh,
    High,
    Medium,
    Low,
    Excluded,
    NotFailure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureType {
    Deployment,
    Critical,
    High,
    Medium,
    Low,
}

/// Which pieces of evidence fired for an issue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalHits {
    pub explicit_label: bool,
    pub content_hits: usize,
    pub release_proximity_hits: usize,
    pub remediation_commit_hits: usize,
    pub severity_hits: usize,
}

/// Classification outcome for one issue. The source issue is referenced by
/// number and never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedIssue {
    pub issue_number: u64,
    pub score: u32,
    pub confidence_level: ConfidenceLevel,
    pub is_excluded: bool,
    pub has_deployment_context: bool,
    pub severity_score: u32,
    pub temporal_score: u32,
    pub context_score: u32,
    pub total_score: u32,
    pub is_failure: bool,
    pub failure_type: FailureType,
    pub signals: SignalHits,
}

impl ClassifiedIssue {
    fn excluded(issue_number: u64) -> Self {
        Self {
            issue_number,
            score: 0,
            confidence_level: ConfidenceLevel::Excluded,
            is_excluded: true,
            has_deployment_context: false,
            severity_score: 0,
            temporal_score: 0,
            context_score: 0,
            total_score: 0,
            is_failure: false,
            failure_type: FailureType::Low,
            signals: SignalHits::default(),
        }
    }
}

pub struct IssueClassifier<'a> {
    config: &'a ScoringConfig,
    release_dates: Vec<DateTime<Utc>>,
    remediation_dates: Vec<DateTime<Utc>>,
}

impl<'a> IssueClassifier<'a> {
    pub fn new(config: &'a ScoringConfig, deployments: &[Deployment], commits: &[Commit]) -> Self {
        let release_dates = deployments
            .iter()
            .filter(|d| d.kind == DeploymentKind::Release)
            .map(|d| d.date)
            .collect();

        let remediation_dates = commits
            .iter()
            .filter(|c| contains_any(&c.message.to_lowercase(), REMEDIATION_MARKERS))
            .map(|c| c.date)
            .collect();

        Self {
            config,
            release_dates,
            remediation_dates,
        }
    }

    pub fn classify(&self, issue: &Issue) -> ClassifiedIssue {
        let text = issue.searchable_text();
        let labels: Vec<String> = issue.labels.iter().map(|l| l.to_lowercase()).collect();

        if is_excluded(&text, &labels) {
            return ClassifiedIssue::excluded(issue.number);
        }

        let mut signals = SignalHits::default();
        let score = self.base_score(&text, &labels, &mut signals);
        let severity_score = self.severity_score(&text, &labels, issue.comments, &mut signals);
        let temporal_score = self.temporal_score(issue.created_at, &mut signals);
        let context_score = self.context_score(&text);
        let has_deployment_context = context_score > 0;

        let total_score = score + severity_score + temporal_score + context_score;
        let is_failure = total_score >= self.config.failure_threshold;

        ClassifiedIssue {
            issue_number: issue.number,
            score,
            confidence_level: self.confidence_level(total_score),
            is_excluded: false,
            has_deployment_context,
            severity_score,
            temporal_score,
            context_score,
            total_score,
            is_failure,
            failure_type: self.failure_type(total_score, has_deployment_context),
            signals,
        }
    }

    fn base_score(&self, text: &str, labels: &[String], signals: &mut SignalHits) -> u32 {
        let weights = &self.config.weights;
        let indicators = || {
            PRIMARY_INDICATORS
                .terms()
                .iter()
                .chain(SECONDARY_INDICATORS.terms())
        };

        let explicit = labels
            .iter()
            .any(|label| indicators().any(|term| label == term));

        let partial_labels = labels
            .iter()
            .filter(|label| !label.is_empty() && !indicators().any(|term| *label == term))
            .filter(|label| {
                indicators().any(|term| label.contains(term) || term.contains(label.as_str()))
            })
            .count();

        let primary_hits = PRIMARY_INDICATORS.matches_in(text).count();
        let secondary_hits = SECONDARY_INDICATORS.matches_in(text).count();

        signals.explicit_label = explicit;
        signals.content_hits = primary_hits + secondary_hits;

        let mut score = 0;
        if explicit {
            score += weights.explicit_label;
        }
        score += weights.primary_keyword * count(primary_hits);
        score += weights.secondary_keyword * count(secondary_hits);
        score += weights.partial_label * count(partial_labels);
        if DEPLOYMENT_CONTEXT.contains_any(text) {
            score += weights.deployment_bonus;
        }

        score
    }

    fn severity_score(
        &self,
        text: &str,
        labels: &[String],
        comments: u32,
        signals: &mut SignalHits,
    ) -> u32 {
        let weights = &self.config.weights;
        let severity_label = labels.iter().any(|l| SEVERITY_LABELS.matches_label(l));
        let keyword_hits = SEVERITY_KEYWORDS.matches_in(text).count();

        let mut score = weights.severity_keyword * count(keyword_hits);
        if severity_label {
            score += weights.severity_label;
        }
        if comments > BUSY_DISCUSSION_COMMENTS {
            score += weights.busy_discussion;
        }
        if comments > VERY_BUSY_DISCUSSION_COMMENTS {
            score += weights.very_busy_discussion;
        }

        signals.severity_hits = keyword_hits + usize::from(severity_label);
        score.min(self.config.caps.severity)
    }

    fn temporal_score(&self, created_at: DateTime<Utc>, signals: &mut SignalHits) -> u32 {
        let weights = &self.config.weights;
        let mut score = 0;

        for release_date in &self.release_dates {
            let days = days_apart(created_at, *release_date);
            let points = if days <= 1.0 {
                weights.release_within_1d
            } else if days <= 3.0 {
                weights.release_within_3d
            } else if days <= 7.0 {
                weights.release_within_7d
            } else {
                continue;
            };
            signals.release_proximity_hits += 1;
            score += points;
        }

        let remediations = self
            .remediation_dates
            .iter()
            .filter(|date| days_apart(created_at, **date) <= REMEDIATION_WINDOW_DAYS)
            .count();
        signals.remediation_commit_hits = remediations;
        score += weights.fix_commit * count(remediations);

        score.min(self.config.caps.temporal)
    }

    fn context_score(&self, text: &str) -> u32 {
        let weights = &self.config.weights;
        let keyword_hits = DEPLOYMENT_CONTEXT.matches_in(text).count();
        let version_hits = version_token_pattern()
            .map(|re| re.find_iter(text).count())
            .unwrap_or(0);

        let score = weights.context_keyword * count(keyword_hits)
            + weights.version_token * count(version_hits);
        score.min(self.config.caps.context)
    }

    fn failure_type(&self, total_score: u32, has_deployment_context: bool) -> FailureType {
        if has_deployment_context {
            FailureType::Deployment
        } else if total_score >= self.config.critical_threshold {
            FailureType::Critical
        } else if total_score >= self.config.high_threshold {
            FailureType::High
        } else if total_score >= self.config.failure_threshold {
            FailureType::Medium
        } else {
            FailureType::Low
        }
    }

    fn confidence_level(&self, total_score: u32) -> ConfidenceLevel {
        if total_score >= self.config.very_high_threshold {
            ConfidenceLevel::VeryHigh
        } else if total_score >= self.config.critical_threshold {
            ConfidenceLevel::High
        } else if total_score >= self.config.high_threshold {
            ConfidenceLevel::Medium
        } else if total_score >= self.config.failure_threshold {
            ConfidenceLevel::Low
        } else {
            ConfidenceLevel::NotFailure
        }
    }
}

fn is_excluded(text: &str, labels: &[String]) -> bool {
    EXCLUSION_TERMS.contains_any(text) || labels.iter().any(|l| EXCLUSION_TERMS.contains_any(l))
}

fn days_apart(a: DateTime<Utc>, b: DateTime<Utc>) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let seconds = (a - b).num_seconds().abs() as f64;
    seconds / SECONDS_PER_DAY
}

fn count(hits: usize) -> u32 {
    u32::try_from(hits).unwrap_or(u32::MAX)
}

/// Classify every issue against the window's deployments and commits.
pub fn classify_issues(
    issues: &[Issue],
    deployments: &[Deployment],
    commits: &[Commit],
    config: &ScoringConfig,
) -> Vec<ClassifiedIssue> {
    let classifier = IssueClassifier::new(config, deployments, commits);
    issues.iter().map(|issue| classifier.classify(issue)).collect()
}

pub fn failures(classified: &[ClassifiedIssue]) -> Vec<&ClassifiedIssue> {
    classified.iter().filter(|c| c.is_failure).collect()
}

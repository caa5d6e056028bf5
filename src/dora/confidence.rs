//! Confidence scoring and change failure rate assembly.
//!
//! The score tells a reader how much evidence backs the failure
//! classification: each signal contributes per distinct failure issue it
//! fired on, and the sum is clamped to 100. Without deployments the rate
//! loses its denominator, so the score is capped lower.

use log::debug;
use serde::{Deserialize, Serialize};

use super::aggregation::partition_failures;
use super::classifier::{failures, ClassifiedIssue};
use super::deployments::{count_kind, Deployment, DeploymentKind};
use crate::insights::{AccuracyIndicators, ChangeFailureRate, DataSources};

const EXPLICIT_LABEL_WEIGHT: u32 = 25;
const CONTENT_ANALYSIS_WEIGHT: u32 = 20;
const COMMIT_PATTERN_WEIGHT: u32 = 15;
const TEMPORAL_CORRELATION_WEIGHT: u32 = 10;
const SEVERITY_ANALYSIS_WEIGHT: u32 = 10;

const MAX_CONFIDENCE: u32 = 100;
const NO_DEPLOYMENT_CONFIDENCE_CAP: u32 = 60;

/// Baseline issue count for the issue-based rate used without deployments.
const ISSUE_RATE_BASELINE: f64 = 100.0;

const NO_DEPLOYMENTS_RATE: &str = "N/A (no deployments)";
const ZERO_RATE: &str = "0%";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceReport {
    pub confidence_score: u32,
    pub accuracy_indicators: AccuracyIndicators,
    pub status: String,
}

fn data_quality(deployments: usize) -> &'static str {
    match deployments {
        5.. => "high",
        2..=4 => "medium",
        _ => "low",
    }
}

fn sample_size(issues_analyzed: usize) -> &'static str {
    match issues_analyzed {
        10.. => "large",
        5..=9 => "medium",
        _ => "small",
    }
}

fn temporal_coverage(days_back: u32) -> &'static str {
    match days_back {
        90.. => "extended",
        30..=89 => "standard",
        _ => "limited",
    }
}

fn confidence_status(score: u32) -> &'static str {
    match score {
        75.. => "High confidence",
        50..=74 => "Moderate confidence",
        1..=49 => "Low confidence",
        0 => "No supporting evidence",
    }
}

fn distinct<F>(failures: &[&ClassifiedIssue], has_signal: F) -> u32
where
    F: Fn(&ClassifiedIssue) -> bool,
{
    let hits = failures.iter().filter(|c| has_signal(**c)).count();
    u32::try_from(hits).unwrap_or(u32::MAX)
}

/// Score how trustworthy the failure classification of a window is.
pub fn score_confidence(
    classified: &[ClassifiedIssue],
    deployments: usize,
    days_back: u32,
) -> ConfidenceReport {
    let failed = failures(classified);

    let explicit = distinct(&failed, |c| c.signals.explicit_label);
    let content = distinct(&failed, |c| c.signals.content_hits > 0);
    let commit_patterns = distinct(&failed, |c| c.signals.remediation_commit_hits > 0);
    let temporal = distinct(&failed, |c| c.signals.release_proximity_hits > 0);
    let severity = distinct(&failed, |c| c.signals.severity_hits > 0);

    let weighted = explicit
        .saturating_mul(EXPLICIT_LABEL_WEIGHT)
        .saturating_add(content.saturating_mul(CONTENT_ANALYSIS_WEIGHT))
        .saturating_add(commit_patterns.saturating_mul(COMMIT_PATTERN_WEIGHT))
        .saturating_add(temporal.saturating_mul(TEMPORAL_CORRELATION_WEIGHT))
        .saturating_add(severity.saturating_mul(SEVERITY_ANALYSIS_WEIGHT));

    let mut confidence_score = weighted.min(MAX_CONFIDENCE);
    if deployments == 0 {
        confidence_score = confidence_score.min(NO_DEPLOYMENT_CONFIDENCE_CAP);
    }

    let pattern_recognition = if content > 0 { "excellent" } else { "good" };

    ConfidenceReport {
        confidence_score,
        accuracy_indicators: AccuracyIndicators {
            data_quality: data_quality(deployments).to_string(),
            sample_size: sample_size(classified.len()).to_string(),
            temporal_coverage: temporal_coverage(days_back).to_string(),
            pattern_recognition: pattern_recognition.to_string(),
        },
        status: confidence_status(confidence_score).to_string(),
    }
}

#[allow(clippy::cast_precision_loss)]
fn percentage(count: usize, denominator: usize) -> String {
    if denominator == 0 {
        return ZERO_RATE.to_string();
    }
    format!("{:.2}%", count as f64 / denominator as f64 * 100.0)
}

/// Change failure rate for one window.
///
/// Rates above 100% are reported as-is when failures outnumber deployments.
pub fn change_failure_rate(
    classified: &[ClassifiedIssue],
    deployments: &[Deployment],
    tags_count: usize,
    days_back: u32,
) -> ChangeFailureRate {
    let buckets = partition_failures(classified);
    let total_failures = buckets.total();
    let total_deployments = deployments.len();
    let confidence = score_confidence(classified, total_deployments, days_back);
    debug!(
        "Failure classification confidence {}: {}",
        confidence.confidence_score, confidence.status
    );

    let (failure_rate, deployment_failure_rate, critical_failure_rate, status) =
        if total_deployments == 0 {
            #[allow(clippy::cast_precision_loss)]
            let issue_rate = if total_failures == 0 {
                ZERO_RATE.to_string()
            } else {
                format!("{:.2}%", total_failures as f64 / ISSUE_RATE_BASELINE)
            };
            (
                issue_rate,
                NO_DEPLOYMENTS_RATE.to_string(),
                NO_DEPLOYMENTS_RATE.to_string(),
                "No deployments found - using issue-based failure rate".to_string(),
            )
        } else {
            (
                percentage(total_failures, total_deployments),
                percentage(buckets.deployment.len(), total_deployments),
                percentage(buckets.critical.len(), total_deployments),
                format!(
                    "Calculated from {total_deployments} deployments and {total_failures} failures"
                ),
            )
        };

    ChangeFailureRate {
        total_deployments,
        deployment_failures: buckets.deployment.len(),
        general_issues: buckets.general.len(),
        critical_failures: buckets.critical.len(),
        failure_rate,
        deployment_failure_rate,
        critical_failure_rate,
        confidence_score: confidence.confidence_score,
        accuracy_indicators: confidence.accuracy_indicators,
        data_sources: DataSources {
            releases: count_kind(deployments, DeploymentKind::Release),
            commit_deployments: count_kind(deployments, DeploymentKind::Commit),
            tags: tags_count,
            issues_analyzed: classified.len(),
            excluded_issues: classified.iter().filter(|c| c.is_excluded).count(),
            failures_detected: total_failures,
        },
        status,
    }
}

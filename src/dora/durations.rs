use chrono::{DateTime, Utc};
use log::warn;

use crate::insights::{DurationSummary, ResolutionSummary};
use crate::signals::{Issue, PullRequest};

const SECONDS_PER_DAY: f64 = 86_400.0;

struct Stats {
    average: f64,
    min: f64,
    max: f64,
    count: usize,
}

#[allow(clippy::cast_precision_loss)]
fn summarize(values: &[f64]) -> Option<Stats> {
    if values.is_empty() {
        return None;
    }

    let sum: f64 = values.iter().sum();
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Some(Stats {
        average: sum / values.len() as f64,
        min,
        max,
        count: values.len(),
    })
}

#[allow(clippy::cast_precision_loss)]
fn elapsed_days(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_seconds() as f64 / SECONDS_PER_DAY
}

fn days(value: f64) -> String {
    format!("{value:.2}")
}

fn zero() -> String {
    days(0.0)
}

/// Lead time for changes: creation to merge, merged pull requests only.
pub fn lead_time(pull_requests: &[PullRequest]) -> DurationSummary {
    let merged: Vec<&PullRequest> = pull_requests
        .iter()
        .filter(|pr| pr.merged_at.is_some())
        .collect();

    let lead_times: Vec<f64> = merged
        .iter()
        .filter_map(|pr| {
            let merged_at = pr.merged_at?;
            let elapsed = elapsed_days(pr.created_at, merged_at);
            if elapsed < 0.0 {
                warn!(
                    "Skipping pull request #{}: merged before it was created",
                    pr.number
                );
                return None;
            }
            Some(elapsed)
        })
        .collect();

    let empty = |status: &str| DurationSummary {
        average_days: zero(),
        min_days: zero(),
        max_days: zero(),
        total_prs_analyzed: 0,
        status: status.to_string(),
    };

    if merged.is_empty() {
        return empty("No merged pull requests found");
    }

    let Some(stats) = summarize(&lead_times) else {
        return empty("No valid lead times found");
    };

    DurationSummary {
        average_days: days(stats.average),
        min_days: days(stats.min),
        max_days: days(stats.max),
        total_prs_analyzed: stats.count,
        status: format!("Calculated from {} merged pull requests", stats.count),
    }
}

/// Mean time to recovery: creation to close, closed issues only.
pub fn mttr(issues: &[Issue]) -> ResolutionSummary {
    let empty = |status: &str| ResolutionSummary {
        average_days: zero(),
        min_days: zero(),
        max_days: zero(),
        total_incidents_analyzed: 0,
        status: status.to_string(),
    };

    if issues.is_empty() {
        return empty("No issues found");
    }

    let resolution_times: Vec<f64> = issues
        .iter()
        .filter_map(|issue| {
            let closed_at = issue.closed_at?;
            let elapsed = elapsed_days(issue.created_at, closed_at);
            if elapsed < 0.0 {
                warn!(
                    "Skipping issue #{}: closed before it was created",
                    issue.number
                );
                return None;
            }
            Some(elapsed)
        })
        .collect();

    let Some(stats) = summarize(&resolution_times) else {
        return empty("No valid resolution times found");
    };

    ResolutionSummary {
        average_days: days(stats.average),
        min_days: days(stats.min),
        max_days: days(stats.max),
        total_incidents_analyzed: stats.count,
        status: format!("Calculated from {} resolved issues", stats.count),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::parse_timestamp;

    fn ts(raw: &str) -> DateTime<Utc> {
        parse_timestamp(raw).unwrap()
    }

    fn pr(number: u64, created: &str, merged: Option<&str>) -> PullRequest {
        PullRequest {
            number,
            state: "closed".to_string(),
            created_at: ts(created),
            merged_at: merged.map(ts),
        }
    }

    fn issue(number: u64, created: &str, closed: Option<&str>) -> Issue {
        Issue {
            number,
            title: "Outage".to_string(),
            body: String::new(),
            labels: vec![],
            comments: 0,
            created_at: ts(created),
            closed_at: closed.map(ts),
        }
    }

    #[test]
    fn test_lead_time_single_pull_request() {
        let summary = lead_time(&[pr(1, "2024-01-01", Some("2024-01-03"))]);

        assert_eq!(summary.average_days, "2.00");
        assert_eq!(summary.min_days, "2.00");
        assert_eq!(summary.max_days, "2.00");
        assert_eq!(summary.total_prs_analyzed, 1);
    }

    #[test]
    fn test_lead_time_ignores_unmerged_pull_requests() {
        let summary = lead_time(&[
            pr(1, "2024-01-01T00:00:00Z", Some("2024-01-01T12:00:00Z")),
            pr(2, "2024-01-01", None),
            pr(3, "2024-01-02", Some("2024-01-05")),
        ]);

        assert_eq!(summary.total_prs_analyzed, 2);
        assert_eq!(summary.average_days, "1.75");
        assert_eq!(summary.min_days, "0.50");
        assert_eq!(summary.max_days, "3.00");
    }

    #[test]
    fn test_lead_time_without_merged_pull_requests_is_zeroed() {
        let summary = lead_time(&[pr(1, "2024-01-01", None)]);

        assert_eq!(summary.average_days, "0.00");
        assert_eq!(summary.total_prs_analyzed, 0);
        assert_eq!(summary.status, "No merged pull requests found");
    }

    #[test]
    fn test_lead_time_skips_negative_durations() {
        let summary = lead_time(&[pr(1, "2024-01-05", Some("2024-01-01"))]);

        assert_eq!(summary.total_prs_analyzed, 0);
        assert_eq!(summary.status, "No valid lead times found");
    }

    #[test]
    fn test_mttr_over_closed_issues() {
        let summary = mttr(&[
            issue(1, "2024-01-01", Some("2024-01-02")),
            issue(2, "2024-01-01", Some("2024-01-04")),
            issue(3, "2024-01-01", None),
        ]);

        assert_eq!(summary.total_incidents_analyzed, 2);
        assert_eq!(summary.average_days, "2.00");
        assert_eq!(summary.min_days, "1.00");
        assert_eq!(summary.max_days, "3.00");
    }

    #[test]
    fn test_mttr_fallback_statuses() {
        assert_eq!(mttr(&[]).status, "No issues found");

        let open_only = mttr(&[issue(1, "2024-01-01", None)]);
        assert_eq!(open_only.status, "No valid resolution times found");
        assert_eq!(open_only.average_days, "0.00");
    }
}

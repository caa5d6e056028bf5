use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use futures::future::join_all;
use log::{error, info, warn};

use super::classifier::classify_issues;
use super::confidence::change_failure_rate;
use super::deployments::detect_deployments;
use super::durations::{lead_time, mttr};
use super::frequency::deployment_frequency;
use crate::config::{ScoringConfig, MAX_DAYS_BACK};
use crate::insights::{AnalysisPeriod, DataSummary, DoraReport, MetricsWindow, RepositoryInfo};
use crate::providers::SignalSource;
use crate::signals::{RawSignals, Signals};

/// Window labels and their length in days, in report order.
pub const WINDOWS: [(&str, u32); 3] = [("7d", 7), ("30d", 30), ("90d", 90)];

/// Midnight UTC of the first day of a `days_back` window ending at `now`.
pub fn window_start(now: DateTime<Utc>, days_back: u32) -> DateTime<Utc> {
    let first_day = now
        .date_naive()
        .checked_sub_days(Days::new(u64::from(days_back.max(1)) - 1))
        .unwrap_or(NaiveDate::MIN);
    first_day.and_time(NaiveTime::MIN).and_utc()
}

/// Compute one window of DORA metrics as of now with the default scoring.
pub fn compute_dora_metrics(
    owner: &str,
    repo: &str,
    raw: &RawSignals,
    days_back: u32,
) -> MetricsWindow {
    compute_window(
        owner,
        repo,
        raw,
        days_back,
        Utc::now(),
        &ScoringConfig::default(),
    )
}

pub fn compute_window(
    owner: &str,
    repo: &str,
    raw: &RawSignals,
    days_back: u32,
    now: DateTime<Utc>,
    config: &ScoringConfig,
) -> MetricsWindow {
    if days_back > MAX_DAYS_BACK {
        warn!("{days_back}-day window requested, using the {MAX_DAYS_BACK}-day maximum");
    }
    let days_back = days_back.min(MAX_DAYS_BACK);
    let start = window_start(now, days_back);
    let signals = Signals::from_raw(raw).within(start, now);

    let deployments = detect_deployments(&signals.releases, &signals.commits);
    let classified = classify_issues(&signals.issues, &deployments, &signals.commits, config);

    info!(
        "{owner}/{repo} ({days_back}d): {} deployments, {} issues classified",
        deployments.len(),
        classified.len()
    );

    MetricsWindow {
        repository: RepositoryInfo::new(owner, repo),
        analysis_period: AnalysisPeriod {
            days_back,
            start_date: start,
            end_date: now,
        },
        deployment_frequency: deployment_frequency(&deployments, days_back, now),
        lead_time: lead_time(&signals.pull_requests),
        mttr: mttr(&signals.issues),
        change_failure_rate: change_failure_rate(
            &classified,
            &deployments,
            signals.tags.len(),
            days_back,
        ),
        data_summary: DataSummary {
            releases_count: signals.releases.len(),
            tags_count: signals.tags.len(),
            commits_count: signals.commits.len(),
            pull_requests_count: signals.pull_requests.len(),
            issues_count: signals.issues.len(),
            analysis_period_days: days_back,
            fetched_at: now,
        },
    }
}

/// Fetch and compute every window concurrently. A window whose retrieval
/// fails is reported as `None` without affecting the others.
pub async fn collect_dora_report<S>(
    source: &S,
    owner: &str,
    repo: &str,
    config: &ScoringConfig,
) -> DoraReport
where
    S: SignalSource + ?Sized,
{
    collect_dora_report_at(source, owner, repo, config, Utc::now()).await
}

pub async fn collect_dora_report_at<S>(
    source: &S,
    owner: &str,
    repo: &str,
    config: &ScoringConfig,
    now: DateTime<Utc>,
) -> DoraReport
where
    S: SignalSource + ?Sized,
{
    let tasks = WINDOWS.iter().map(|&(label, days_back)| async move {
        let since = window_start(now, days_back);

        match source.fetch_signals(owner, repo, since).await {
            Ok(raw) => {
                let window = compute_window(owner, repo, &raw, days_back, now, config);
                (label, Some(window))
            }
            Err(e) => {
                error!("Failed to compute {label} metrics for {owner}/{repo}: {e}");
                (label, None)
            }
        }
    });

    join_all(tasks)
        .await
        .into_iter()
        .map(|(label, window)| (label.to_string(), window))
        .collect()
}

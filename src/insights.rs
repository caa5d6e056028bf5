use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Metrics keyed by window label (`7d`, `30d`, `90d`); `None` marks a
/// window whose data could not be produced.
pub type DoraReport = IndexMap<String, Option<MetricsWindow>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsWindow {
    pub repository: RepositoryInfo,
    pub analysis_period: AnalysisPeriod,
    pub deployment_frequency: DeploymentFrequency,
    pub lead_time: DurationSummary,
    pub mttr: ResolutionSummary,
    pub change_failure_rate: ChangeFailureRate,
    pub data_summary: DataSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub name: String,
    pub owner: String,
    pub full_name: String,
    pub url: String,
}

impl RepositoryInfo {
    pub fn new(owner: &str, repo: &str) -> Self {
        Self {
            name: repo.to_string(),
            owner: owner.to_string(),
            full_name: format!("{owner}/{repo}"),
            url: format!("https://github.com/{owner}/{repo}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisPeriod {
    pub days_back: u32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentFrequency {
    pub total_deployments: usize,
    pub analysis_period_days: u32,
    #[serde(rename = "perDay")]
    pub per_day: Vec<usize>,
    #[serde(rename = "perWeek")]
    pub per_week: Vec<usize>,
    #[serde(rename = "perMonth")]
    pub per_month: Vec<usize>,
    pub months: Vec<String>,
    pub status: String,
    pub frequency_per_day: String,
    pub frequency_per_week: String,
    pub frequency_per_month: String,
}

/// Lead time for changes, in days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationSummary {
    pub average_days: String,
    pub min_days: String,
    pub max_days: String,
    pub total_prs_analyzed: usize,
    pub status: String,
}

/// Mean time to recovery, in days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionSummary {
    pub average_days: String,
    pub min_days: String,
    pub max_days: String,
    pub total_incidents_analyzed: usize,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeFailureRate {
    pub total_deployments: usize,
    pub deployment_failures: usize,
    pub general_issues: usize,
    pub critical_failures: usize,
    pub failure_rate: String,
    pub deployment_failure_rate: String,
    pub critical_failure_rate: String,
    pub confidence_score: u32,
    pub accuracy_indicators: AccuracyIndicators,
    pub data_sources: DataSources,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccuracyIndicators {
    pub data_quality: String,
    pub sample_size: String,
    pub temporal_coverage: String,
    pub pattern_recognition: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSources {
    pub releases: usize,
    pub commit_deployments: usize,
    pub tags: usize,
    pub issues_analyzed: usize,
    pub excluded_issues: usize,
    pub failures_detected: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSummary {
    pub releases_count: usize,
    pub tags_count: usize,
    pub commits_count: usize,
    pub pull_requests_count: usize,
    pub issues_count: usize,
    pub analysis_period_days: u32,
    pub fetched_at: DateTime<Utc>,
}

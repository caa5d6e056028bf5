//! Input schemas for GitHub repository activity.
//!
//! `RawSignals` mirrors the REST payloads with dates kept as strings, so a
//! single malformed timestamp never fails deserialization of a whole page.
//! `Signals::from_raw` is the validation boundary: records missing a
//! required date are dropped with a warning and everything downstream works
//! on parsed `DateTime<Utc>` values.

use chrono::{DateTime, NaiveDate, Utc};
use log::warn;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSignals {
    #[serde(default)]
    pub releases: Vec<ReleaseDto>,
    #[serde(default)]
    pub tags: Vec<TagDto>,
    #[serde(default)]
    pub commits: Vec<CommitDto>,
    #[serde(default)]
    pub pull_requests: Vec<PullRequestDto>,
    #[serde(default)]
    pub issues: Vec<IssueDto>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReleaseDto {
    #[serde(default)]
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TagDto {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub commit: TagCommitDto,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TagCommitDto {
    #[serde(default)]
    pub sha: String,
    /// Only present once the tag has been enriched with its commit.
    #[serde(default)]
    pub commit: Option<CommitDetailDto>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommitDto {
    #[serde(default)]
    pub sha: String,
    #[serde(default)]
    pub commit: CommitDetailDto,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommitDetailDto {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub author: Option<CommitAuthorDto>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommitAuthorDto {
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PullRequestDto {
    #[serde(default)]
    pub number: u64,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub merged_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueDto {
    #[serde(default)]
    pub number: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub labels: Vec<LabelDto>,
    #[serde(default)]
    pub comments: u32,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub closed_at: Option<String>,
    /// Set by the issues endpoint when the entry is really a pull request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabelDto {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Release {
    pub tag_name: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub draft: bool,
    pub prerelease: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub name: String,
    pub sha: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Commit {
    pub sha: String,
    pub message: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PullRequest {
    pub number: u64,
    pub state: String,
    pub created_at: DateTime<Utc>,
    pub merged_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
    pub comments: u32,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl Issue {
    /// Title and body joined and lower-cased, the text the classifier scans.
    pub fn searchable_text(&self) -> String {
        format!("{} {}", self.title, self.body).to_lowercase()
    }
}

/// Validated activity for one repository.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signals {
    pub releases: Vec<Release>,
    pub tags: Vec<Tag>,
    pub commits: Vec<Commit>,
    pub pull_requests: Vec<PullRequest>,
    pub issues: Vec<Issue>,
}

/// Parse a GitHub timestamp. Accepts RFC 3339 and bare `YYYY-MM-DD` dates.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn required_date(raw: Option<&str>, record: &str, field: &str) -> Option<DateTime<Utc>> {
    match raw {
        None => {
            warn!("Skipping {record}: missing {field}");
            None
        }
        Some(value) => {
            let parsed = parse_timestamp(value);
            if parsed.is_none() {
                warn!("Skipping {record}: unparseable {field} '{value}'");
            }
            parsed
        }
    }
}

fn optional_date(raw: Option<&str>, record: &str, field: &str) -> Option<DateTime<Utc>> {
    let value = raw?;
    let parsed = parse_timestamp(value);
    if parsed.is_none() {
        warn!("Ignoring unparseable {field} '{value}' on {record}");
    }
    parsed
}

impl Signals {
    pub fn from_raw(raw: &RawSignals) -> Self {
        let releases = raw
            .releases
            .iter()
            .filter_map(|r| {
                let record = format!("release {}", r.tag_name);
                let created_at = required_date(r.created_at.as_deref(), &record, "created_at")?;
                let name = r
                    .name
                    .clone()
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| r.tag_name.clone());

                Some(Release {
                    tag_name: r.tag_name.clone(),
                    name,
                    created_at,
                    draft: r.draft,
                    prerelease: r.prerelease,
                })
            })
            .collect();

        let tags = raw
            .tags
            .iter()
            .filter_map(|t| {
                let record = format!("tag {}", t.name);
                let date = t
                    .commit
                    .commit
                    .as_ref()
                    .and_then(|c| c.author.as_ref())
                    .and_then(|a| a.date.as_deref());
                let date = required_date(date, &record, "commit.commit.author.date")?;

                Some(Tag {
                    name: t.name.clone(),
                    sha: t.commit.sha.clone(),
                    date,
                })
            })
            .collect();

        let commits = raw
            .commits
            .iter()
            .filter_map(|c| {
                let record = format!("commit {}", short_sha(&c.sha));
                let date = c.commit.author.as_ref().and_then(|a| a.date.as_deref());
                let date = required_date(date, &record, "commit.author.date")?;

                Some(Commit {
                    sha: c.sha.clone(),
                    message: c.commit.message.clone(),
                    date,
                })
            })
            .collect();

        let pull_requests = raw
            .pull_requests
            .iter()
            .filter_map(|pr| {
                let record = format!("pull request #{}", pr.number);
                let created_at = required_date(pr.created_at.as_deref(), &record, "created_at")?;

                Some(PullRequest {
                    number: pr.number,
                    state: pr.state.clone(),
                    created_at,
                    merged_at: optional_date(pr.merged_at.as_deref(), &record, "merged_at"),
                })
            })
            .collect();

        let issues = raw
            .issues
            .iter()
            .filter(|i| i.pull_request.is_none())
            .filter_map(|i| {
                let record = format!("issue #{}", i.number);
                let created_at = required_date(i.created_at.as_deref(), &record, "created_at")?;

                Some(Issue {
                    number: i.number,
                    title: i.title.clone(),
                    body: i.body.clone().unwrap_or_default(),
                    labels: i.labels.iter().filter_map(|l| l.name.clone()).collect(),
                    comments: i.comments,
                    created_at,
                    closed_at: optional_date(i.closed_at.as_deref(), &record, "closed_at"),
                })
            })
            .collect();

        Self {
            releases,
            tags,
            commits,
            pull_requests,
            issues,
        }
    }

    /// Keep only records whose primary date falls inside `[start, end]`.
    pub fn within(self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        let in_range = |date: &DateTime<Utc>| *date >= start && *date <= end;

        Self {
            releases: self
                .releases
                .into_iter()
                .filter(|r| in_range(&r.created_at))
                .collect(),
            tags: self.tags.into_iter().filter(|t| in_range(&t.date)).collect(),
            commits: self
                .commits
                .into_iter()
                .filter(|c| in_range(&c.date))
                .collect(),
            pull_requests: self
                .pull_requests
                .into_iter()
                .filter(|pr| in_range(&pr.created_at))
                .collect(),
            issues: self
                .issues
                .into_iter()
                .filter(|i| in_range(&i.created_at))
                .collect(),
        }
    }
}

pub fn short_sha(sha: &str) -> &str {
    sha.get(..7).unwrap_or(sha)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn raw_from(value: serde_json::Value) -> RawSignals {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_parse_timestamp_accepts_rfc3339_and_plain_dates() {
        let full = parse_timestamp("2024-01-03T12:30:00Z").unwrap();
        let plain = parse_timestamp("2024-01-03").unwrap();

        assert_eq!(full, Utc.with_ymd_and_hms(2024, 1, 3, 12, 30, 0).unwrap());
        assert_eq!(plain, Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_records_without_required_dates_are_skipped() {
        let raw = raw_from(json!({
            "releases": [
                {"tag_name": "v1.0.0", "created_at": "2024-01-01T00:00:00Z"},
                {"tag_name": "v1.1.0"},
                {"tag_name": "v1.2.0", "created_at": "not a date"}
            ],
            "commits": [
                {"sha": "abcdef123456", "commit": {"message": "ok", "author": {"date": "2024-01-02T00:00:00Z"}}},
                {"sha": "0123456789ab", "commit": {"message": "no author"}}
            ],
            "issues": [
                {"number": 1, "title": "fine", "created_at": "2024-01-02T00:00:00Z"},
                {"number": 2, "title": "no date"}
            ]
        }));

        let signals = Signals::from_raw(&raw);

        assert_eq!(signals.releases.len(), 1);
        assert_eq!(signals.commits.len(), 1);
        assert_eq!(signals.issues.len(), 1);
        assert_eq!(signals.issues[0].number, 1);
    }

    #[test]
    fn test_unparseable_optional_dates_become_none() {
        let raw = raw_from(json!({
            "pull_requests": [
                {"number": 7, "state": "closed", "created_at": "2024-01-01", "merged_at": "garbage"}
            ],
            "issues": [
                {"number": 3, "title": "x", "created_at": "2024-01-01", "closed_at": "garbage"}
            ]
        }));

        let signals = Signals::from_raw(&raw);

        assert_eq!(signals.pull_requests[0].merged_at, None);
        assert_eq!(signals.issues[0].closed_at, None);
    }

    #[test]
    fn test_pull_requests_listed_as_issues_are_dropped() {
        let raw = raw_from(json!({
            "issues": [
                {"number": 1, "title": "real issue", "created_at": "2024-01-01"},
                {"number": 2, "title": "a PR", "created_at": "2024-01-01", "pull_request": {"url": "x"}}
            ]
        }));

        let signals = Signals::from_raw(&raw);

        assert_eq!(signals.issues.len(), 1);
        assert_eq!(signals.issues[0].number, 1);
    }

    #[test]
    fn test_release_name_falls_back_to_tag() {
        let raw = raw_from(json!({
            "releases": [{"tag_name": "v2.0.0", "name": "  ", "created_at": "2024-02-01"}]
        }));

        let signals = Signals::from_raw(&raw);

        assert_eq!(signals.releases[0].name, "v2.0.0");
    }

    #[test]
    fn test_tag_date_comes_from_enriched_commit() {
        let raw = raw_from(json!({
            "tags": [
                {"name": "v1.0.0", "commit": {"sha": "abc", "commit": {"message": "", "author": {"date": "2024-03-01T10:00:00Z"}}}},
                {"name": "v0.9.0", "commit": {"sha": "def"}}
            ]
        }));

        let signals = Signals::from_raw(&raw);

        assert_eq!(signals.tags.len(), 1);
        assert_eq!(signals.tags[0].name, "v1.0.0");
    }

    #[test]
    fn test_within_filters_by_primary_date() {
        let raw = raw_from(json!({
            "issues": [
                {"number": 1, "title": "old", "created_at": "2023-12-01"},
                {"number": 2, "title": "new", "created_at": "2024-01-10"}
            ]
        }));

        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();
        let signals = Signals::from_raw(&raw).within(start, end);

        assert_eq!(signals.issues.len(), 1);
        assert_eq!(signals.issues[0].number, 2);
    }

    #[test]
    fn test_short_sha_handles_short_input() {
        assert_eq!(short_sha("abcdef0123"), "abcdef0");
        assert_eq!(short_sha("abc"), "abc");
    }
}

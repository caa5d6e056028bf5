use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::vocabulary::{contains_any, DEPLOYMENT_COMMIT_MARKERS};
use crate::signals::{short_sha, Commit, Release};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentKind {
    Release,
    Commit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    #[serde(rename = "type")]
    pub kind: DeploymentKind,
    pub date: DateTime<Utc>,
    pub version: String,
    pub label: String,
}

fn is_deployable(release: &Release) -> bool {
    !release.draft && !release.prerelease
}

fn is_deployment_commit(commit: &Commit) -> bool {
    contains_any(&commit.message.to_lowercase(), DEPLOYMENT_COMMIT_MARKERS)
}

/// Merge formal releases and deploy-flavoured commits into one timeline,
/// ascending by date.
///
/// Many repositories ship through commit or tag conventions rather than
/// GitHub Releases, so both sources count.
pub fn detect_deployments(releases: &[Release], commits: &[Commit]) -> Vec<Deployment> {
    let from_releases = releases.iter().filter(|r| is_deployable(r)).map(|r| Deployment {
        kind: DeploymentKind::Release,
        date: r.created_at,
        version: r.tag_name.clone(),
        label: r.name.clone(),
    });

    let from_commits = commits
        .iter()
        .filter(|c| is_deployment_commit(c))
        .map(|c| Deployment {
            kind: DeploymentKind::Commit,
            date: c.date,
            version: short_sha(&c.sha).to_string(),
            label: c.message.lines().next().unwrap_or_default().to_string(),
        });

    let mut deployments: Vec<Deployment> = from_releases.chain(from_commits).collect();
    deployments.sort_by_key(|d| d.date);
    deployments
}

pub fn count_kind(deployments: &[Deployment], kind: DeploymentKind) -> usize {
    deployments.iter().filter(|d| d.kind == kind).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(n)
    }

    fn release(tag: &str, at: i64, draft: bool, prerelease: bool) -> Release {
        Release {
            tag_name: tag.to_string(),
            name: format!("Release {tag}"),
            created_at: day(at),
            draft,
            prerelease,
        }
    }

    fn commit(sha: &str, message: &str, at: i64) -> Commit {
        Commit {
            sha: sha.to_string(),
            message: message.to_string(),
            date: day(at),
        }
    }

    #[test]
    fn test_drafts_and_prereleases_are_not_deployments() {
        let releases = vec![
            release("v1.0.0", 1, false, false),
            release("v1.1.0-rc1", 2, false, true),
            release("v1.1.0", 3, true, false),
        ];

        let deployments = detect_deployments(&releases, &[]);

        assert_eq!(deployments.len(), 1);
        assert_eq!(deployments[0].version, "v1.0.0");
        assert_eq!(deployments[0].kind, DeploymentKind::Release);
        assert_eq!(deployments[0].label, "Release v1.0.0");
    }

    #[test]
    fn test_deploy_flavoured_commits_become_deployments() {
        let commits = vec![
            commit("0123456789abcdef", "Deploy to Production\n\nlong body", 1),
            commit("fedcba9876543210", "refactor parser", 2),
            commit("aaaaaaaaaaaaaaaa", "HOTFIX: null pointer", 3),
        ];

        let deployments = detect_deployments(&[], &commits);

        assert_eq!(deployments.len(), 2);
        assert_eq!(deployments[0].version, "0123456");
        assert_eq!(deployments[0].label, "Deploy to Production");
        assert_eq!(deployments[1].kind, DeploymentKind::Commit);
    }

    #[test]
    fn test_timeline_is_sorted_for_any_input_order() {
        let releases = vec![release("v3", 9, false, false), release("v1", 1, false, false)];
        let commits = vec![
            commit("c5c5c5c5c5", "release prep", 5),
            commit("c2c2c2c2c2", "emergency deploy", 2),
        ];

        let mut reversed_releases = releases.clone();
        reversed_releases.reverse();
        let mut reversed_commits = commits.clone();
        reversed_commits.reverse();

        for (r, c) in [(&releases, &commits), (&reversed_releases, &reversed_commits)] {
            let deployments = detect_deployments(r, c);
            assert_eq!(deployments.len(), 4);
            assert!(deployments.windows(2).all(|w| w[0].date <= w[1].date));
        }
    }

    #[test]
    fn test_no_inputs_means_no_deployments() {
        assert!(detect_deployments(&[], &[]).is_empty());
    }

    #[test]
    fn test_count_kind_splits_sources() {
        let deployments = detect_deployments(
            &[release("v1", 1, false, false)],
            &[commit("abcdefabcdef", "deploy", 2)],
        );

        assert_eq!(count_kind(&deployments, DeploymentKind::Release), 1);
        assert_eq!(count_kind(&deployments, DeploymentKind::Commit), 1);
    }
}

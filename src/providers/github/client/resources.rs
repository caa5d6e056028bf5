use chrono::{DateTime, SecondsFormat, Utc};
use log::debug;
use serde::de::DeserializeOwned;

use super::core::GitHubClient;
use crate::error::{DoraLensError, Result};
use crate::signals::{CommitDto, IssueDto, PullRequestDto, ReleaseDto, TagDto};

impl GitHubClient {
    /// Fetch every page of a repository collection, bounded by `max_pages`.
    async fn fetch_paginated<T: DeserializeOwned>(
        &self,
        owner: &str,
        repo: &str,
        resource: &str,
        params: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let base = self
            .repo_url(owner, repo)?
            .join(resource)
            .map_err(|e| DoraLensError::Config(format!("Invalid {resource} URL: {e}")))?;

        let page_size = self.options.page_size;
        let mut all_items = Vec::new();

        for page in 1..=self.options.max_pages {
            let mut url = base.clone();
            url.query_pairs_mut()
                .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())))
                .append_pair("per_page", &page_size.to_string())
                .append_pair("page", &page.to_string());

            let items: Vec<T> = self.get_json(&url).await?;
            let fetched = items.len();
            all_items.extend(items);

            debug!(
                "{owner}/{repo} {resource} page {page}: {fetched} items (total: {})",
                all_items.len()
            );

            if fetched < page_size as usize {
                break;
            }
        }

        Ok(all_items)
    }

    pub async fn fetch_releases(&self, owner: &str, repo: &str) -> Result<Vec<ReleaseDto>> {
        self.fetch_paginated(owner, repo, "releases", &[]).await
    }

    pub async fn fetch_tags(&self, owner: &str, repo: &str) -> Result<Vec<TagDto>> {
        self.fetch_paginated(owner, repo, "tags", &[]).await
    }

    pub async fn fetch_commits(
        &self,
        owner: &str,
        repo: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<CommitDto>> {
        let params = [("since", iso8601(since))];
        self.fetch_paginated(owner, repo, "commits", &params).await
    }

    /// Most recently created pull requests first, any state.
    pub async fn fetch_pull_requests(&self, owner: &str, repo: &str) -> Result<Vec<PullRequestDto>> {
        let params = [
            ("state", "all".to_string()),
            ("sort", "created".to_string()),
            ("direction", "desc".to_string()),
        ];
        self.fetch_paginated(owner, repo, "pulls", &params).await
    }

    /// Issues updated since `since`. The endpoint also returns pull
    /// requests; those are filtered out during validation.
    pub async fn fetch_issues(
        &self,
        owner: &str,
        repo: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<IssueDto>> {
        let params = [("state", "all".to_string()), ("since", iso8601(since))];
        self.fetch_paginated(owner, repo, "issues", &params).await
    }

    pub async fn fetch_commit(&self, owner: &str, repo: &str, sha: &str) -> Result<CommitDto> {
        let url = self
            .repo_url(owner, repo)?
            .join(&format!("commits/{}", urlencoding::encode(sha)))
            .map_err(|e| DoraLensError::Config(format!("Invalid commit URL: {e}")))?;

        self.get_json(&url).await
    }
}

fn iso8601(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

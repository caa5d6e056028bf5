use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::{stream, StreamExt};
use log::{info, warn};

use super::client::{ClientOptions, GitHubClient};
use crate::auth::TokenRing;
use crate::config::ScoringConfig;
use crate::dora::collect_dora_report;
use crate::error::Result;
use crate::insights::DoraReport;
use crate::providers::SignalSource;
use crate::signals::{RawSignals, TagDto};

const CONCURRENCY: usize = 10;

/// Tags beyond this many (newest first, as GitHub lists them) are not
/// dated and therefore fall out of every window.
const MAX_DATED_TAGS: usize = 30;

pub struct GitHubProvider {
    pub client: GitHubClient,
}

impl GitHubProvider {
    pub fn new(base_url: &str, tokens: TokenRing, options: ClientOptions) -> Result<Self> {
        if tokens.is_empty() {
            warn!("No GitHub tokens configured, requests are unauthenticated");
        }

        let client = GitHubClient::new(base_url, tokens, options)?;

        Ok(Self { client })
    }

    /// Tags come without dates; look up each tag's commit to get one.
    async fn fetch_dated_tags(&self, owner: &str, repo: &str) -> Result<Vec<TagDto>> {
        let tags = self.client.fetch_tags(owner, repo).await?;
        let skipped = tags.len().saturating_sub(MAX_DATED_TAGS);
        if skipped > 0 {
            warn!(
                "Dating only the newest {MAX_DATED_TAGS} tags of {owner}/{repo}, {skipped} skipped"
            );
        }

        let dated = stream::iter(tags.into_iter().take(MAX_DATED_TAGS))
            .map(|mut tag| async move {
                match self.client.fetch_commit(owner, repo, &tag.commit.sha).await {
                    Ok(commit) => tag.commit.commit = Some(commit.commit),
                    Err(e) => warn!("Could not date tag {}: {e}", tag.name),
                }
                tag
            })
            .buffer_unordered(CONCURRENCY)
            .collect::<Vec<_>>()
            .await;

        Ok(dated)
    }

    pub async fn collect_report(
        &self,
        owner: &str,
        repo: &str,
        config: &ScoringConfig,
    ) -> DoraReport {
        info!("Starting DORA collection for {owner}/{repo}");
        collect_dora_report(self, owner, repo, config).await
    }
}

#[async_trait]
impl SignalSource for GitHubProvider {
    async fn fetch_signals(
        &self,
        owner: &str,
        repo: &str,
        since: DateTime<Utc>,
    ) -> Result<RawSignals> {
        let (releases, tags, commits, pull_requests, issues) = tokio::try_join!(
            self.client.fetch_releases(owner, repo),
            self.fetch_dated_tags(owner, repo),
            self.client.fetch_commits(owner, repo, since),
            self.client.fetch_pull_requests(owner, repo),
            self.client.fetch_issues(owner, repo, since),
        )?;

        info!(
            "Fetched {owner}/{repo} since {since}: {} releases, {} tags, {} commits, {} pull requests, {} issues",
            releases.len(),
            tags.len(),
            commits.len(),
            pull_requests.len(),
            issues.len()
        );

        Ok(RawSignals {
            releases,
            tags,
            commits,
            pull_requests,
            issues,
        })
    }
}

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use log::info;
use serde::Serialize;
use std::path::PathBuf;

use doralens::auth::TokenRing;
use doralens::config::{ScoringConfig, MAX_DAYS_BACK};
use doralens::dora::compute_window;
use doralens::providers::github::{ClientOptions, GitHubProvider};
use doralens::signals::RawSignals;

#[derive(Parser)]
#[command(name = "doralens")]
#[command(author, version, about = "DORA metrics from GitHub activity", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output file path (defaults to stdout)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Pretty print JSON output
    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,

    /// Minimum issue score that counts as a failure; higher tiers move up with it
    #[arg(long, global = true, default_value_t = 12)]
    failure_threshold: u32,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect 7d, 30d and 90d metrics for a GitHub repository
    Github {
        /// Comma-separated GitHub tokens, rotated between requests
        #[arg(short, long, env = "GITHUB_TOKENS", hide_env_values = true)]
        tokens: Option<String>,

        /// GitHub API URL
        #[arg(short, long, default_value = "https://api.github.com")]
        url: String,

        /// Repository owner
        #[arg(short = 'O', long)]
        owner: String,

        /// Repository name
        #[arg(short, long)]
        repo: String,

        /// Retries for rate-limited or failing requests
        #[arg(long, default_value_t = 3)]
        max_retries: u32,
    },

    /// Compute one window from previously fetched activity
    Compute {
        /// JSON file with releases, tags, commits, pull_requests and issues
        #[arg(short, long)]
        input: PathBuf,

        /// Repository owner
        #[arg(short = 'O', long)]
        owner: String,

        /// Repository name
        #[arg(short, long)]
        repo: String,

        /// Window length in days
        #[arg(
            short,
            long,
            default_value_t = 30,
            value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_DAYS_BACK))
        )]
        days: u32,
    },
}

impl Cli {
    pub async fn execute(&self) -> Result<()> {
        let config = ScoringConfig::default().with_failure_threshold(self.failure_threshold);
        config.validate()?;

        match &self.command {
            Commands::Github {
                tokens,
                url,
                owner,
                repo,
                max_retries,
            } => {
                info!("Collecting DORA metrics for {owner}/{repo}");

                let tokens = TokenRing::from_list(tokens.as_deref().unwrap_or_default());
                let options = ClientOptions {
                    max_retries: *max_retries,
                    ..ClientOptions::default()
                };
                let provider = GitHubProvider::new(url, tokens, options)?;
                let report = provider.collect_report(owner, repo, &config).await;

                self.write(&report)
            }
            Commands::Compute {
                input,
                owner,
                repo,
                days,
            } => {
                let contents = std::fs::read_to_string(input)
                    .with_context(|| format!("Failed to read {}", input.display()))?;
                let raw: RawSignals = serde_json::from_str(&contents)
                    .with_context(|| format!("Invalid activity JSON in {}", input.display()))?;

                let window = compute_window(owner, repo, &raw, *days, Utc::now(), &config);

                self.write(&window)
            }
        }
    }

    fn write<T: Serialize>(&self, value: &T) -> Result<()> {
        let json_output = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };

        if let Some(output_path) = &self.output {
            std::fs::write(output_path, json_output)?;
            info!("Metrics written to: {}", output_path.display());
        } else {
            println!("{json_output}");
        }

        Ok(())
    }
}

use std::time::Duration;

use log::warn;
use reqwest::header::ACCEPT;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::auth::TokenRing;
use crate::error::{DoraLensError, Result};

const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";

#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Retries after the first attempt for rate-limited or 5xx responses.
    pub max_retries: u32,
    /// Linear backoff step between retries.
    pub backoff: Duration,
    pub page_size: u32,
    pub max_pages: u32,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: Duration::from_secs(2),
            page_size: 100,
            max_pages: 10,
        }
    }
}

pub struct GitHubClient {
    pub client: Client,
    pub api_url: Url,
    pub tokens: TokenRing,
    pub options: ClientOptions,
}

impl GitHubClient {
    pub fn new(base_url: &str, tokens: TokenRing, options: ClientOptions) -> Result<Self> {
        let client = Client::builder()
            .user_agent("DoraLens/0.1.0")
            .build()
            .map_err(|e| DoraLensError::Config(format!("Failed to create HTTP client: {e}")))?;

        // `Url::join` drops the last path segment unless it ends with '/'
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let api_url = Url::parse(&normalized)
            .map_err(|e| DoraLensError::Config(format!("Invalid base URL: {e}")))?;

        Ok(Self {
            client,
            api_url,
            tokens,
            options,
        })
    }

    /// Attach the next token from the ring, if any.
    pub fn auth_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(token) = self.tokens.next_token() {
            request.bearer_auth(token.as_str())
        } else {
            request
        }
    }

    pub fn repo_url(&self, owner: &str, repo: &str) -> Result<Url> {
        self.api_url
            .join(&format!(
                "repos/{}/{}/",
                urlencoding::encode(owner),
                urlencoding::encode(repo)
            ))
            .map_err(|e| DoraLensError::Config(format!("Invalid repository URL: {e}")))
    }

    /// GET a JSON document, rotating tokens and backing off on rate limits
    /// and server errors.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T> {
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            let request = self
                .client
                .get(url.clone())
                .header(ACCEPT, "application/vnd.github+json");
            let response = match self.auth_request(request).send().await {
                Ok(response) => response,
                Err(e) if is_transient(&e) && attempt <= self.options.max_retries => {
                    warn!(
                        "Request to {url} failed (attempt {attempt}/{}): {e}, retrying",
                        self.options.max_retries + 1
                    );
                    tokio::time::sleep(self.options.backoff * attempt).await;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            let status = response.status();

            if status.is_success() {
                return Ok(response.json::<T>().await?);
            }

            let rate_limited = is_rate_limited(&response);
            if !rate_limited && !status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                return Err(DoraLensError::Api(format!("{status} from {url}: {body}")));
            }

            if attempt > self.options.max_retries {
                return Err(if rate_limited {
                    DoraLensError::RateLimited {
                        url: url.to_string(),
                        attempts: attempt,
                    }
                } else {
                    DoraLensError::Api(format!("{status} from {url} after {attempt} attempts"))
                });
            }

            warn!(
                "{status} from {url} (attempt {attempt}/{}), rotating token and retrying",
                self.options.max_retries + 1
            );
            tokio::time::sleep(self.options.backoff * attempt).await;
        }
    }
}

/// Connection failures and timeouts, which a later attempt may not hit.
fn is_transient(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect()
}

fn is_rate_limited(response: &Response) -> bool {
    match response.status() {
        StatusCode::TOO_MANY_REQUESTS => true,
        StatusCode::FORBIDDEN => response
            .headers()
            .get(RATE_LIMIT_REMAINING)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|remaining| remaining.trim() == "0"),
        _ => false,
    }
}

pub mod github;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::signals::RawSignals;

/// Anything that can hand the engine one window of repository activity.
///
/// Implementations own retries, rate limiting and token handling; a
/// returned error means the window could not be retrieved at all.
#[async_trait]
pub trait SignalSource: Send + Sync {
    async fn fetch_signals(
        &self,
        owner: &str,
        repo: &str,
        since: DateTime<Utc>,
    ) -> Result<RawSignals>;
}

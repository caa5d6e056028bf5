use serde::{Deserialize, Serialize};

use super::classifier::{ClassifiedIssue, FailureType};

/// Disjoint partition of classified failures, by issue number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureBuckets {
    pub deployment: Vec<u64>,
    pub critical: Vec<u64>,
    pub general: Vec<u64>,
}

impl FailureBuckets {
    pub fn total(&self) -> usize {
        self.deployment.len() + self.critical.len() + self.general.len()
    }
}

/// Split the failure set into deployment, critical and general buckets.
/// Non-failures are ignored.
pub fn partition_failures(classified: &[ClassifiedIssue]) -> FailureBuckets {
    classified
        .iter()
        .filter(|c| c.is_failure)
        .fold(FailureBuckets::default(), |mut buckets, failure| {
            let bucket = match failure.failure_type {
                FailureType::Deployment => &mut buckets.deployment,
                FailureType::Critical => &mut buckets.critical,
                FailureType::High | FailureType::Medium | FailureType::Low => &mut buckets.general,
            };
            bucket.push(failure.issue_number);
            buckets
        })
}

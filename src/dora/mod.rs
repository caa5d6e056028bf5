//! DORA metric engine: deployment detection, failure classification,
//! metric calculators and the per-window orchestration around them.

pub mod aggregation;
pub mod classifier;
pub mod confidence;
pub mod deployments;
pub mod durations;
pub mod frequency;
pub mod vocabulary;
pub mod window;

pub use aggregation::{partition_failures, FailureBuckets};
pub use classifier::{
    classify_issues, failures, ClassifiedIssue, ConfidenceLevel, FailureType, IssueClassifier,
};
pub use confidence::{change_failure_rate, score_confidence, ConfidenceReport};
pub use deployments::{detect_deployments, Deployment, DeploymentKind};
pub use durations::{lead_time, mttr};
pub use frequency::deployment_frequency;
pub use window::{collect_dora_report, compute_dora_metrics, compute_window, WINDOWS};

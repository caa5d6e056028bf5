use crate::error::{DoraLensError, Result};

/// Longest analysis window accepted, in days. Longer requests are clamped.
pub const MAX_DAYS_BACK: u32 = 3_650;

/// Tunable thresholds and weights for failure classification.
///
/// The defaults are the reference heuristic. None of them has a derivation
/// beyond "works on typical repositories", so callers may override them.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    /// Minimum total score for an issue to count as a failure.
    pub failure_threshold: u32,
    pub high_threshold: u32,
    pub critical_threshold: u32,
    pub very_high_threshold: u32,
    pub weights: SignalWeights,
    pub caps: ScoreCaps,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalWeights {
    pub explicit_label: u32,
    pub primary_keyword: u32,
    pub secondary_keyword: u32,
    pub partial_label: u32,
    pub deployment_bonus: u32,
    pub severity_label: u32,
    pub severity_keyword: u32,
    pub busy_discussion: u32,
    pub very_busy_discussion: u32,
    pub release_within_1d: u32,
    pub release_within_3d: u32,
    pub release_within_7d: u32,
    pub fix_commit: u32,
    pub context_keyword: u32,
    pub version_token: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreCaps {
    pub severity: u32,
    pub temporal: u32,
    pub context: u32,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            explicit_label: 15,
            primary_keyword: 8,
            secondary_keyword: 3,
            partial_label: 5,
            deployment_bonus: 5,
            severity_label: 8,
            severity_keyword: 3,
            busy_discussion: 2,
            very_busy_discussion: 3,
            release_within_1d: 10,
            release_within_3d: 6,
            release_within_7d: 3,
            fix_commit: 2,
            context_keyword: 5,
            version_token: 3,
        }
    }
}

impl Default for ScoreCaps {
    fn default() -> Self {
        Self {
            severity: 15,
            temporal: 20,
            context: 15,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 12,
            high_threshold: 15,
            critical_threshold: 20,
            very_high_threshold: 25,
            weights: SignalWeights::default(),
            caps: ScoreCaps::default(),
        }
    }
}

impl ScoringConfig {
    /// Set the failure threshold, raising the higher tiers when needed so
    /// that each stays at least one point above the one below.
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self.high_threshold = self.high_threshold.max(threshold.saturating_add(1));
        self.critical_threshold = self
            .critical_threshold
            .max(self.high_threshold.saturating_add(1));
        self.very_high_threshold = self
            .very_high_threshold
            .max(self.critical_threshold.saturating_add(1));
        self
    }

    /// Thresholds must be strictly increasing from failure to very high.
    pub fn validate(&self) -> Result<()> {
        let ordered = self.failure_threshold < self.high_threshold
            && self.high_threshold < self.critical_threshold
            && self.critical_threshold < self.very_high_threshold;

        if !ordered {
            return Err(DoraLensError::Config(format!(
                "score thresholds must increase: failure={} high={} critical={} very_high={}",
                self.failure_threshold,
                self.high_threshold,
                self.critical_threshold,
                self.very_high_threshold
            )));
        }

        Ok(())
    }
}

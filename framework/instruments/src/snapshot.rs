use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::stats::DurationStats;

/// Summary of one named duration metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    /// Number of accepted duration samples.
    pub count: u64,
    /// Requests for this metric that could not be completed, so have no duration sample.
    pub errors: u64,
    pub stats: Option<DurationStats>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckSummary {
    pub passes: u64,
    pub fails: u64,
}

impl CheckSummary {
    pub fn total(&self) -> u64 {
        self.passes + self.fails
    }

    /// Fraction of evaluations that passed, `0.0` when the check never ran.
    pub fn pass_rate(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.passes as f64 / total as f64,
        }
    }
}

/// Point in time view of a [crate::MetricCollector].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub trends: BTreeMap<String, TrendSummary>,
    pub checks: BTreeMap<String, CheckSummary>,
    /// Every request that was sent, whether or not a response came back.
    pub requests: u64,
    /// Requests that errored or received a non-2xx status.
    pub failed_requests: u64,
    pub iterations_completed: u64,
    pub iterations_aborted: u64,
    pub malformed_samples: u64,
}

impl MetricsSnapshot {
    pub fn total_iterations(&self) -> u64 {
        self.iterations_completed + self.iterations_aborted
    }

    pub fn request_failure_rate(&self) -> f64 {
        match self.requests {
            0 => 0.0,
            requests => self.failed_requests as f64 / requests as f64,
        }
    }

    pub fn trend(&self, metric: &str) -> Option<&TrendSummary> {
        self.trends.get(metric)
    }

    pub fn check(&self, check: &str) -> Option<&CheckSummary> {
        self.checks.get(check)
    }
}

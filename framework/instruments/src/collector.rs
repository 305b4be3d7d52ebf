use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use breeze_core::prelude::MalformedSample;
use parking_lot::{Mutex, RwLock};

use crate::snapshot::{CheckSummary, MetricsSnapshot, TrendSummary};
use crate::stats::DurationStats;

/// One recorded duration.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub metric: String,
    pub timestamp: SystemTime,
    pub duration_ms: f64,
    pub tags: Vec<(String, String)>,
}

impl Sample {
    /// A sample timestamped now, without tags.
    pub fn new(metric: impl Into<String>, duration_ms: f64) -> Self {
        Self {
            metric: metric.into(),
            timestamp: SystemTime::now(),
            duration_ms,
            tags: Vec::new(),
        }
    }

    pub fn with_tag(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.tags.push((name.into(), value.to_string()));
        self
    }
}

#[derive(Debug, Default)]
struct MetricSeries {
    samples: Vec<Sample>,
    errors: u64,
}

#[derive(Debug, Default)]
struct CheckCounter {
    passes: AtomicU64,
    fails: AtomicU64,
}

/// Collects samples and counters from every virtual user in a run.
///
/// Each named metric is guarded by its own lock, so writers for different metrics do not contend
/// and [MetricCollector::snapshot] holds a lock only while it copies the values of one metric.
/// Counters only ever increase.
#[derive(Debug, Default)]
pub struct MetricCollector {
    series: RwLock<HashMap<String, Arc<Mutex<MetricSeries>>>>,
    checks: RwLock<HashMap<String, Arc<CheckCounter>>>,
    requests: AtomicU64,
    failed_requests: AtomicU64,
    iterations_completed: AtomicU64,
    iterations_aborted: AtomicU64,
    malformed_samples: AtomicU64,
}

impl MetricCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a duration in milliseconds for `metric`.
    ///
    /// Negative and non-finite values are not mixed into the statistics, they are counted as
    /// malformed samples instead.
    pub fn record_duration(&self, metric: &str, duration_ms: f64) {
        self.record_sample(Sample::new(metric, duration_ms));
    }

    pub fn record_sample(&self, sample: Sample) {
        if let Err(e) = validate(&sample) {
            log::debug!("Rejected sample: {e}");
            self.malformed_samples.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let series = self.series_for(&sample.metric);
        series.lock().samples.push(sample);
    }

    pub fn record_check(&self, check: &str, passed: bool) {
        let counter = self.check_for(check);
        if passed {
            counter.passes.fetch_add(1, Ordering::Relaxed);
        } else {
            counter.fails.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Count a request that was sent. A request has failed if it errored or its response was not
    /// a 2xx.
    pub fn record_request(&self, failed: bool) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Count a request for `metric` that could not be completed. No duration is recorded for it.
    pub fn record_request_error(&self, metric: &str) {
        self.series_for(metric).lock().errors += 1;
    }

    pub fn record_iteration(&self, aborted: bool) {
        if aborted {
            self.iterations_aborted.fetch_add(1, Ordering::Relaxed);
        } else {
            self.iterations_completed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Copy of every sample recorded so far for `metric`, in the order they were appended.
    pub fn samples(&self, metric: &str) -> Vec<Sample> {
        let series = self.series.read().get(metric).cloned();
        series
            .map(|series| series.lock().samples.clone())
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let series = self
            .series
            .read()
            .iter()
            .map(|(name, series)| (name.clone(), series.clone()))
            .collect::<Vec<_>>();

        let trends = series
            .into_iter()
            .map(|(name, series)| {
                let (mut values, errors) = {
                    let guard = series.lock();
                    let values = guard
                        .samples
                        .iter()
                        .map(|sample| sample.duration_ms)
                        .collect::<Vec<_>>();
                    (values, guard.errors)
                };

                let summary = TrendSummary {
                    count: values.len() as u64,
                    errors,
                    stats: DurationStats::from_values(&mut values),
                };
                (name, summary)
            })
            .collect();

        let checks = self
            .checks
            .read()
            .iter()
            .map(|(name, counter)| {
                (
                    name.clone(),
                    CheckSummary {
                        passes: counter.passes.load(Ordering::Relaxed),
                        fails: counter.fails.load(Ordering::Relaxed),
                    },
                )
            })
            .collect();

        MetricsSnapshot {
            trends,
            checks,
            requests: self.requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            iterations_completed: self.iterations_completed.load(Ordering::Relaxed),
            iterations_aborted: self.iterations_aborted.load(Ordering::Relaxed),
            malformed_samples: self.malformed_samples.load(Ordering::Relaxed),
        }
    }

    fn series_for(&self, metric: &str) -> Arc<Mutex<MetricSeries>> {
        if let Some(series) = self.series.read().get(metric) {
            return series.clone();
        }

        self.series
            .write()
            .entry(metric.to_string())
            .or_default()
            .clone()
    }

    fn check_for(&self, check: &str) -> Arc<CheckCounter> {
        if let Some(counter) = self.checks.read().get(check) {
            return counter.clone();
        }

        self.checks
            .write()
            .entry(check.to_string())
            .or_default()
            .clone()
    }
}

fn validate(sample: &Sample) -> Result<(), MalformedSample> {
    if sample.duration_ms.is_finite() && sample.duration_ms >= 0.0 {
        Ok(())
    } else {
        Err(MalformedSample {
            metric: sample.metric.clone(),
            value: sample.duration_ms,
        })
    }
}

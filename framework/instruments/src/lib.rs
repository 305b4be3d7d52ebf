//! Metric collection and reporting for load test runs.
//!
//! A single [MetricCollector] is shared by every virtual user in a run. Its [MetricsSnapshot] is
//! handed to a [Reporter] periodically and once at the end of the run.

mod collector;
mod report;
mod snapshot;
mod stats;

pub use collector::{MetricCollector, Sample};
pub use report::{
    format_check, render_summary, JsonLinesReportCollector, ReportCollector, ReportConfig,
    Reporter, SummaryReportCollector,
};
pub use snapshot::{CheckSummary, MetricsSnapshot, TrendSummary};
pub use stats::{nearest_rank, DurationStats};

mod json_lines_report;
mod summary_report;

use std::path::PathBuf;
use std::time::Duration;

use parking_lot::Mutex;

use crate::snapshot::MetricsSnapshot;

pub use json_lines_report::JsonLinesReportCollector;
pub use summary_report::{format_check, render_summary, SummaryReportCollector};

/// A destination for snapshots of a run.
pub trait ReportCollector: Send {
    /// Called with a snapshot taken while the run is still in progress.
    fn interim(&mut self, _elapsed: Duration, _snapshot: &MetricsSnapshot) {}

    /// Called once with the final snapshot after every virtual user has exited.
    fn finalize(&mut self, elapsed: Duration, snapshot: &MetricsSnapshot);
}

/// Choose which report collectors a run should use.
#[derive(Debug, Clone, Default)]
pub struct ReportConfig {
    scenario_name: String,
    enable_summary: bool,
    json_lines_file: Option<PathBuf>,
}

impl ReportConfig {
    pub fn new(scenario_name: impl Into<String>) -> Self {
        Self {
            scenario_name: scenario_name.into(),
            ..Default::default()
        }
    }

    /// Print tables summarising the run to stdout.
    pub fn enable_summary(mut self) -> Self {
        self.enable_summary = true;
        self
    }

    /// Append every interim and final snapshot to `path`, one JSON object per line.
    pub fn enable_json_lines_file(mut self, path: PathBuf) -> Self {
        self.json_lines_file = Some(path);
        self
    }

    pub fn init(self) -> Reporter {
        let mut collectors: Vec<Box<dyn ReportCollector>> = Vec::new();

        if self.enable_summary {
            collectors.push(Box::new(SummaryReportCollector::new(
                self.scenario_name.clone(),
            )));
        }

        if let Some(path) = self.json_lines_file {
            match JsonLinesReportCollector::new(&path, self.scenario_name.clone()) {
                Ok(collector) => collectors.push(Box::new(collector)),
                Err(e) => {
                    log::warn!("Not writing snapshots to {}: {:?}", path.display(), e);
                }
            }
        }

        Reporter::new(collectors)
    }
}

/// Fans snapshots out to every configured [ReportCollector].
pub struct Reporter {
    collectors: Mutex<Vec<Box<dyn ReportCollector>>>,
}

impl Reporter {
    pub fn new(collectors: Vec<Box<dyn ReportCollector>>) -> Self {
        Self {
            collectors: Mutex::new(collectors),
        }
    }

    /// A reporter that discards everything.
    pub fn noop() -> Self {
        Self::new(Vec::new())
    }

    pub fn add_collector(&self, collector: Box<dyn ReportCollector>) {
        self.collectors.lock().push(collector);
    }

    pub fn interim(&self, elapsed: Duration, snapshot: &MetricsSnapshot) {
        for collector in self.collectors.lock().iter_mut() {
            collector.interim(elapsed, snapshot);
        }
    }

    pub fn finalize(&self, elapsed: Duration, snapshot: &MetricsSnapshot) {
        for collector in self.collectors.lock().iter_mut() {
            collector.finalize(elapsed, snapshot);
        }
    }
}

impl std::fmt::Debug for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter")
            .field("collectors", &self.collectors.lock().len())
            .finish()
    }
}

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::Serialize;

use crate::report::ReportCollector;
use crate::snapshot::MetricsSnapshot;

#[derive(Serialize)]
struct SnapshotLine<'a> {
    scenario: &'a str,
    kind: &'static str,
    timestamp: String,
    elapsed_ms: u64,
    snapshot: &'a MetricsSnapshot,
}

/// Appends snapshots to a file as JSON lines, so interim progress can be inspected or plotted
/// after the run.
pub struct JsonLinesReportCollector {
    scenario_name: String,
    writer: BufWriter<File>,
}

impl JsonLinesReportCollector {
    pub fn new(path: &Path, scenario_name: String) -> anyhow::Result<Self> {
        let file = std::fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .with_context(|| format!("Failed to open report file {}", path.display()))?;

        Ok(Self {
            scenario_name,
            writer: BufWriter::new(file),
        })
    }

    fn write_line(
        &mut self,
        kind: &'static str,
        elapsed: Duration,
        snapshot: &MetricsSnapshot,
    ) -> anyhow::Result<()> {
        let line = SnapshotLine {
            scenario: &self.scenario_name,
            kind,
            timestamp: chrono::Utc::now().to_rfc3339(),
            elapsed_ms: elapsed.as_millis() as u64,
            snapshot,
        };
        serde_json::to_writer(&mut self.writer, &line)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;

        Ok(())
    }
}

impl ReportCollector for JsonLinesReportCollector {
    fn interim(&mut self, elapsed: Duration, snapshot: &MetricsSnapshot) {
        if let Err(e) = self.write_line("interim", elapsed, snapshot) {
            log::warn!("Failed to write interim snapshot: {:?}", e);
        }
    }

    fn finalize(&mut self, elapsed: Duration, snapshot: &MetricsSnapshot) {
        if let Err(e) = self.write_line("final", elapsed, snapshot) {
            log::warn!("Failed to write final snapshot: {:?}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MetricCollector;
    use std::io::BufRead;

    #[test]
    fn writes_one_line_per_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshots.jsonl");

        let collector = MetricCollector::new();
        collector.record_duration("Get posts", 8.0);
        collector.record_iteration(false);

        let mut report = JsonLinesReportCollector::new(&path, "post_flow".to_string()).unwrap();
        report.interim(Duration::from_secs(1), &collector.snapshot());
        collector.record_iteration(true);
        report.finalize(Duration::from_secs(2), &collector.snapshot());

        let lines = std::io::BufReader::new(File::open(&path).unwrap())
            .lines()
            .map(|line| serde_json::from_str::<serde_json::Value>(&line.unwrap()).unwrap())
            .collect::<Vec<_>>();

        assert_eq!(2, lines.len());
        assert_eq!("interim", lines[0]["kind"]);
        assert_eq!("post_flow", lines[0]["scenario"]);
        assert_eq!(1000, lines[0]["elapsed_ms"]);
        assert_eq!(0, lines[0]["snapshot"]["iterations_aborted"]);
        assert_eq!("final", lines[1]["kind"]);
        assert_eq!(1, lines[1]["snapshot"]["iterations_aborted"]);
        assert_eq!(1, lines[1]["snapshot"]["trends"]["Get posts"]["count"]);
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let collector = MetricCollector::new();
        collector.record_duration("Create post", 21.0);
        collector.record_check("status 200 (create post)", false);
        let snapshot = collector.snapshot();

        let json = serde_json::to_string(&snapshot).unwrap();
        let restored: MetricsSnapshot = serde_json::from_str(&json).unwrap();

        assert_eq!(snapshot, restored);
    }
}

mod tables;

use std::fmt::Write;
use std::time::Duration;

use tabled::settings::Style;
use tabled::Table;

use crate::report::summary_report::tables::{CheckRow, TrendRow};
use crate::report::ReportCollector;
use crate::snapshot::{CheckSummary, MetricsSnapshot};

/// Prints the run summary as tables once the run has finished. Interim snapshots are logged as a
/// single progress line.
pub struct SummaryReportCollector {
    scenario_name: String,
}

impl SummaryReportCollector {
    pub fn new(scenario_name: String) -> Self {
        Self { scenario_name }
    }
}

impl ReportCollector for SummaryReportCollector {
    fn interim(&mut self, elapsed: Duration, snapshot: &MetricsSnapshot) {
        log::info!(
            "[{}s] iterations: {} completed, {} aborted; requests: {} ({:.2}% failed)",
            elapsed.as_secs(),
            snapshot.iterations_completed,
            snapshot.iterations_aborted,
            snapshot.requests,
            snapshot.request_failure_rate() * 100.0,
        );
    }

    fn finalize(&mut self, elapsed: Duration, snapshot: &MetricsSnapshot) {
        println!("{}", render_summary(&self.scenario_name, elapsed, snapshot));
    }
}

/// Render the final summary for a run.
pub fn render_summary(scenario_name: &str, elapsed: Duration, snapshot: &MetricsSnapshot) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "\nSummary of {} after {:.2}s",
        scenario_name,
        elapsed.as_secs_f64()
    );

    if !snapshot.checks.is_empty() {
        out.push('\n');
        for (name, summary) in &snapshot.checks {
            out.push_str(&format_check(name, summary));
            out.push('\n');
        }
    }

    let trend_rows = snapshot
        .trends
        .iter()
        .map(|(metric, summary)| TrendRow::new(metric, summary))
        .collect::<Vec<_>>();
    if !trend_rows.is_empty() {
        let mut table = Table::new(trend_rows);
        table.with(Style::modern());
        let _ = writeln!(out, "\n{table}");
    }

    let check_rows = snapshot
        .checks
        .iter()
        .map(|(check, summary)| CheckRow::new(check, summary))
        .collect::<Vec<_>>();
    if !check_rows.is_empty() {
        let mut table = Table::new(check_rows);
        table.with(Style::modern());
        let _ = writeln!(out, "\n{table}");
    }

    let _ = writeln!(
        out,
        "\nhttp_req_failed: {:.2}% ({} of {} requests)",
        snapshot.request_failure_rate() * 100.0,
        snapshot.failed_requests,
        snapshot.requests,
    );
    let _ = writeln!(
        out,
        "iterations: {} ({} completed, {} aborted)",
        snapshot.total_iterations(),
        snapshot.iterations_completed,
        snapshot.iterations_aborted,
    );
    if snapshot.malformed_samples > 0 {
        let _ = writeln!(out, "malformed samples: {}", snapshot.malformed_samples);
    }

    out
}

/// One check in the compact pass/fail notation, with a breakdown line when anything failed.
pub fn format_check(name: &str, summary: &CheckSummary) -> String {
    if summary.fails == 0 {
        format!("✓ {name}")
    } else {
        format!(
            "✗ {name}\n  ↳ {:.0}% — ✓ {} / ✗ {}",
            (summary.pass_rate() * 100.0).floor(),
            summary.passes,
            summary.fails
        )
    }
}

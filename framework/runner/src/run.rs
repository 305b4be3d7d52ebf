use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use breeze_instruments::{MetricCollector, MetricsSnapshot, ReportConfig, Reporter};
use breeze_summary_model::{append_run_summary, RunSummary};

use crate::definition::{ScenarioDefinition, ScenarioDefinitionBuilder};
use crate::executor::Executor;
use crate::monitor::start_monitor;
use crate::progress::start_progress;
use crate::scheduler::{VirtualUserScheduler, VirtualUserSummary};
use crate::shutdown::start_shutdown_listener;
use crate::transport::{HttpTransport, Transport};
use crate::types::BreezeResult;
use crate::workflow::WorkflowRunner;

/// The outcome of a finished run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: String,
    pub scenario_name: String,
    pub elapsed: Duration,
    /// Final snapshot, taken after every virtual user exited.
    pub snapshot: MetricsSnapshot,
    pub virtual_users: Vec<VirtualUserSummary>,
}

impl RunReport {
    /// Iterations run across all virtual users, whether they completed or aborted.
    pub fn total_iterations(&self) -> u64 {
        self.virtual_users
            .iter()
            .map(VirtualUserSummary::iterations)
            .sum()
    }
}

/// Run a scenario to completion and report on it.
///
/// The configuration is validated before anything is started. After that, failures inside
/// iterations only show up in the report. Blocks the calling thread, so it must not be called from
/// within an async runtime.
pub fn run(definition: ScenarioDefinitionBuilder) -> BreezeResult<RunReport> {
    let definition = definition.build()?;
    let run_id = nanoid::nanoid!();
    let started_at = chrono::Utc::now().timestamp();

    log::info!("Running scenario: {} ({})", definition.name, run_id);

    let transport: Arc<dyn Transport> = match &definition.transport {
        Some(transport) => transport.clone(),
        None => Arc::new(
            HttpTransport::new(definition.config.request_timeout)
                .context("Failed to create HTTP client")?,
        ),
    };

    let runtime = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
    let shutdown_handle = definition.shutdown_handle.clone();
    start_shutdown_listener(&runtime, shutdown_handle.clone());
    let executor = Executor::new(runtime, shutdown_handle.clone());
    let reporter = Arc::new(report_config(&definition).init());

    let collector = Arc::new(MetricCollector::new());
    let runner = Arc::new(
        WorkflowRunner::new(
            definition.scenario.clone(),
            transport,
            collector.clone(),
            definition.config.base_url.clone(),
        )
        .with_sleep_override(definition.config.sleep_override),
    );
    let scheduler = VirtualUserScheduler::new(runner, shutdown_handle.clone())
        .with_ramp_up(definition.config.ramp_up);

    let started = Instant::now();

    if let Some(duration) = definition.config.stop_condition.duration() {
        if !definition.no_progress {
            // If the run is time bounded then show the user how long is left
            start_progress(duration, shutdown_handle.new_listener());
        }

        // Virtual users check the elapsed time themselves, the timer also wakes up everything
        // else that is waiting on the shutdown signal.
        let shutdown_handle = shutdown_handle.clone();
        executor.spawn(async move {
            tokio::time::sleep(duration).await;
            shutdown_handle.shutdown();
        });
    }

    if let Some(interval) = definition.config.report_interval {
        start_interim_reports(&executor, interval, started, collector.clone(), reporter.clone());
    }

    // Ready to start the virtual users so start the resource monitor to report high usage which
    // might lead to misleading latencies.
    start_monitor(shutdown_handle.new_listener());

    let config = &definition.config;
    let virtual_users = executor.execute_in_place(async {
        scheduler
            .start(config.virtual_users, config.stop_condition)
            .join()
            .await
    });

    // Every virtual user has exited, stop the timer, progress bar, monitor and interim reports.
    shutdown_handle.shutdown();

    let elapsed = started.elapsed();
    let snapshot = collector.snapshot();
    reporter.finalize(elapsed, &snapshot);

    let report = RunReport {
        run_id,
        scenario_name: definition.name.clone(),
        elapsed,
        snapshot,
        virtual_users,
    };

    log::info!(
        "Scenario {} finished after {:.2}s: {} iterations by {} virtual users",
        report.scenario_name,
        elapsed.as_secs_f64(),
        report.total_iterations(),
        report.virtual_users.len(),
    );

    if let Some(path) = &definition.summary_file {
        // Don't fail the run if the summary can't be written. The report has already been
        // produced.
        if let Err(e) = append_run_summary(run_summary(&definition, &report, started_at), path.clone()) {
            log::error!("Failed to write run summary to {}: {:?}", path.display(), e);
        }
    }

    Ok(report)
}

fn report_config(definition: &ScenarioDefinition) -> ReportConfig {
    let mut config = ReportConfig::new(definition.name.clone());
    if definition.print_summary {
        config = config.enable_summary();
    }
    if let Some(path) = &definition.report_file {
        config = config.enable_json_lines_file(path.clone());
    }
    config
}

fn start_interim_reports(
    executor: &Executor,
    interval: Duration,
    started: Instant,
    collector: Arc<MetricCollector>,
    reporter: Arc<Reporter>,
) {
    executor.spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        loop {
            ticker.tick().await;
            reporter.interim(started.elapsed(), &collector.snapshot());
        }
    });
}

fn run_summary(definition: &ScenarioDefinition, report: &RunReport, started_at: i64) -> RunSummary {
    let config = &definition.config;
    let mut summary = RunSummary::new(
        report.run_id.clone(),
        report.scenario_name.clone(),
        started_at,
        config.stop_condition.duration().map(|d| d.as_secs()),
        config.stop_condition.iteration_cap(),
        config.virtual_users,
        env!("CARGO_PKG_VERSION").to_string(),
    );
    summary.set_virtual_user_end_count(report.virtual_users.len());
    summary.set_iterations(
        report.snapshot.iterations_completed,
        report.snapshot.iterations_aborted,
    );
    summary.add_env("BREEZE_TARGET_URL".to_string(), config.base_url.clone());

    summary
}

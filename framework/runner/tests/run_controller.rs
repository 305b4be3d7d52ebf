use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use breeze_runner::prelude::*;

fn sample_cli_cfg() -> BreezeScenarioCli {
    BreezeScenarioCli {
        target_url: Some("http://target/api".to_string()),
        vus: None,
        duration: None,
        iterations: None,
        sleep_ms: None,
        request_timeout_s: 30,
        ramp_up_s: None,
        report_interval_s: None,
        no_progress: true,
        summary_file: None,
        report_file: None,
    }
}

/// Responds with the given status after a short pause, counting every request. Each response
/// reports a distinct elapsed time: the nth request took n milliseconds.
struct CountingTransport {
    status: u16,
    sent: AtomicU64,
}

impl CountingTransport {
    fn new(status: u16) -> Arc<Self> {
        Arc::new(Self {
            status,
            sent: AtomicU64::new(0),
        })
    }

    fn sent(&self) -> u64 {
        self.sent.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for CountingTransport {
    async fn send(&self, _request: PreparedRequest) -> Result<StepResponse, RequestError> {
        let n = self.sent.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(Duration::from_millis(1)).await;
        Ok(StepResponse::new(self.status, "").with_elapsed(Duration::from_millis(n)))
    }
}

/// Fails the request at `fail_path` with the given status and answers 200 for everything else.
struct FailingPathTransport {
    fail_path: &'static str,
}

#[async_trait]
impl Transport for FailingPathTransport {
    async fn send(&self, request: PreparedRequest) -> Result<StepResponse, RequestError> {
        let status = if request.url.ends_with(self.fail_path) {
            500
        } else {
            200
        };
        Ok(StepResponse::new(status, r#"{"id": 1}"#).with_elapsed(Duration::from_millis(2)))
    }
}

#[test]
fn invalid_configuration_fails_before_any_request() {
    let transport = CountingTransport::new(200);
    let mut cfg = sample_cli_cfg();
    cfg.vus = Some(0);
    cfg.iterations = Some(1);

    let scenario = ScenarioDefinitionBuilder::new("invalid_configuration", cfg)
        .add_step(Step::get("Get posts", "/posts"))
        .with_transport(transport.clone())
        .without_summary();

    let result = run(scenario);

    let err = result.unwrap_err();
    assert_eq!(
        Some(&ConfigurationError::NoVirtualUsers),
        err.downcast_ref::<ConfigurationError>()
    );
    assert_eq!(0, transport.sent());
}

#[test]
fn missing_target_url_is_a_configuration_error() {
    let mut cfg = sample_cli_cfg();
    cfg.target_url = None;

    let scenario = ScenarioDefinitionBuilder::new("missing_target_url", cfg)
        .with_default_duration_s(1)
        .add_step(Step::get("Get posts", "/posts"));

    let err = run(scenario).unwrap_err();

    assert_eq!(
        Some(&ConfigurationError::EmptyBaseUrl),
        err.downcast_ref::<ConfigurationError>()
    );
}

#[test]
fn scenario_without_steps_is_a_configuration_error() {
    let scenario = ScenarioDefinitionBuilder::new("no_steps", sample_cli_cfg())
        .with_default_duration_s(1);

    let err = run(scenario).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ConfigurationError>(),
        Some(ConfigurationError::EmptyScenario { .. })
    ));
}

#[test]
fn zero_report_interval_is_a_configuration_error() {
    let transport = CountingTransport::new(200);
    let mut cfg = sample_cli_cfg();
    cfg.duration = Some(2);
    cfg.report_interval_s = Some(0);

    let scenario = ScenarioDefinitionBuilder::new("zero_report_interval", cfg)
        .add_step(Step::get("Get posts", "/posts"))
        .with_transport(transport.clone())
        .without_summary();

    let err = run(scenario).unwrap_err();

    assert_eq!(
        Some(&ConfigurationError::ZeroReportInterval),
        err.downcast_ref::<ConfigurationError>()
    );
    assert_eq!(0, transport.sent());
}

#[test]
fn optional_failing_checks_complete_every_iteration() {
    let transport = CountingTransport::new(500);
    let mut cfg = sample_cli_cfg();
    cfg.vus = Some(3);
    cfg.iterations = Some(5);

    let scenario = ScenarioDefinitionBuilder::new("optional_failing_checks", cfg)
        .add_step(Step::get("Get posts", "/posts"))
        .add_step(Step::post("Create comment", "/comments"))
        .add_step(Step::put("Like post", "/posts/1/likes"))
        .with_transport(transport.clone())
        .without_summary();

    let report = run(scenario).unwrap();

    assert_eq!(15, report.total_iterations());
    assert_eq!(15, report.snapshot.iterations_completed);
    assert_eq!(0, report.snapshot.iterations_aborted);
    assert_eq!(45, transport.sent());
    for check in report.snapshot.checks.values() {
        assert_eq!(0, check.passes);
        assert_eq!(15, check.fails);
    }
    assert_eq!(1.0, report.snapshot.request_failure_rate());
}

#[test]
fn required_step_failure_aborts_every_iteration() {
    let mut cfg = sample_cli_cfg();
    cfg.vus = Some(4);
    cfg.iterations = Some(3);

    let scenario = ScenarioDefinitionBuilder::new("required_step_failure", cfg)
        .add_step(Step::get("Get posts", "/posts"))
        .add_step(
            Step::post("Create post", "/create")
                .extract("/id", "post_id")
                .required(),
        )
        .add_step(Step::put("View post", "/posts/{post_id}/views"))
        .add_step(Step::put("Like post", "/posts/{post_id}/likes"))
        .with_transport(Arc::new(FailingPathTransport {
            fail_path: "/create",
        }))
        .without_summary();

    let report = run(scenario).unwrap();

    let snapshot = &report.snapshot;
    assert_eq!(12, snapshot.iterations_aborted);
    assert_eq!(0, snapshot.iterations_completed);
    assert_eq!(12, snapshot.trend("Get posts").unwrap().count);
    assert_eq!(12, snapshot.trend("Create post").unwrap().count);
    assert!(snapshot.trend("View post").is_none());
    assert!(snapshot.trend("Like post").is_none());
    assert!(report.virtual_users.iter().all(|user| user.aborted == 3));
}

#[test]
fn duration_bounded_run_terminates() {
    let mut cfg = sample_cli_cfg();
    cfg.vus = Some(10);
    cfg.duration = Some(1);

    let scenario = ScenarioDefinitionBuilder::new("duration_bounded", cfg)
        .add_step(Step::get("Get posts", "/posts"))
        .add_step(Step::get("Get post", "/posts/1"))
        .with_transport(CountingTransport::new(200))
        .without_summary();

    let started = Instant::now();
    let report = run(scenario).unwrap();
    let elapsed = started.elapsed();

    assert!(elapsed >= Duration::from_secs(1));
    // One iteration here takes a few milliseconds, allow generous slack for slow CI machines.
    assert!(elapsed < Duration::from_secs(5), "Run took {:?}", elapsed);
    assert_eq!(10, report.virtual_users.len());
    assert!(report.total_iterations() > 0);
    assert_eq!(report.total_iterations(), report.snapshot.total_iterations());
}

#[test]
fn concurrent_samples_are_all_recorded() {
    let transport = CountingTransport::new(200);
    let mut cfg = sample_cli_cfg();
    cfg.vus = Some(100);
    cfg.iterations = Some(3);

    let scenario = ScenarioDefinitionBuilder::new("concurrent_samples", cfg)
        .add_step(Step::get("Get posts", "/posts"))
        .with_transport(transport.clone())
        .without_summary();

    let report = run(scenario).unwrap();

    let trend = report.snapshot.trend("Get posts").unwrap();
    assert_eq!(300, trend.count);
    let stats = trend.stats.as_ref().unwrap();
    // Request n reported n milliseconds.
    assert_eq!(1.0, stats.min);
    assert_eq!(300.0, stats.max);
    assert_eq!(300, report.total_iterations());
}

#[test]
fn external_shutdown_stops_the_run() {
    let shutdown_handle = ShutdownHandle::new();
    let mut cfg = sample_cli_cfg();
    cfg.vus = Some(5);
    cfg.duration = Some(3600);

    let scenario = ScenarioDefinitionBuilder::new("external_shutdown", cfg)
        .add_step(Step::get("Get posts", "/posts"))
        .with_transport(CountingTransport::new(200))
        .with_shutdown_handle(shutdown_handle.clone())
        .without_summary();

    let trigger = shutdown_handle.clone();
    std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(200));
        trigger.shutdown();
    });

    let started = Instant::now();
    let report = run(scenario).unwrap();

    assert!(started.elapsed() < Duration::from_secs(60));
    assert_eq!(report.total_iterations(), report.snapshot.total_iterations());
}

#[test]
fn summary_and_report_files_are_written() {
    let dir = tempfile::tempdir().unwrap();
    let summary_file = dir.path().join("summaries.jsonl");
    let report_file = dir.path().join("snapshots.jsonl");

    let mut cfg = sample_cli_cfg();
    cfg.vus = Some(2);
    cfg.iterations = Some(2);
    cfg.summary_file = Some(summary_file.clone());
    cfg.report_file = Some(report_file.clone());

    let scenario = ScenarioDefinitionBuilder::new("files_written", cfg)
        .add_step(Step::get("Get posts", "/posts"))
        .with_transport(CountingTransport::new(200))
        .without_summary();

    let report = run(scenario).unwrap();

    let summaries = breeze_summary_model::load_summary_runs(summary_file).unwrap();
    assert_eq!(1, summaries.len());
    assert_eq!(report.run_id, summaries[0].run_id);
    assert_eq!("files_written", summaries[0].scenario_name);
    assert_eq!(Some(2), summaries[0].iteration_cap);
    assert_eq!(None, summaries[0].run_duration);
    assert_eq!(2, summaries[0].virtual_users);
    assert_eq!(2, summaries[0].virtual_user_end_count);
    assert_eq!(4, summaries[0].total_iterations());

    let snapshots = std::fs::read_to_string(report_file).unwrap();
    let last = snapshots.lines().last().unwrap();
    let last: serde_json::Value = serde_json::from_str(last).unwrap();
    assert_eq!("final", last["kind"]);
    assert_eq!(4, last["snapshot"]["iterations_completed"]);
}

#[test]
fn interim_snapshots_precede_the_final_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let report_file = dir.path().join("snapshots.jsonl");

    let mut cfg = sample_cli_cfg();
    cfg.vus = Some(2);
    cfg.duration = Some(3);
    cfg.report_interval_s = Some(1);
    cfg.report_file = Some(report_file.clone());

    let scenario = ScenarioDefinitionBuilder::new("interim_snapshots", cfg)
        .add_step(Step::get("Get posts", "/posts"))
        .with_transport(CountingTransport::new(200))
        .without_summary();

    let report = run(scenario).unwrap();

    let lines = std::fs::read_to_string(report_file)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str::<serde_json::Value>(line).unwrap())
        .collect::<Vec<_>>();
    let kinds = lines
        .iter()
        .map(|line| line["kind"].as_str().unwrap().to_string())
        .collect::<Vec<_>>();

    assert!(kinds.len() >= 2, "Report lines: {:?}", kinds);
    assert_eq!("interim", kinds[0]);
    assert_eq!("final", kinds[kinds.len() - 1]);
    assert_eq!(1, kinds.iter().filter(|kind| *kind == "final").count());

    let last = &lines[lines.len() - 1]["snapshot"];
    let completed = last["iterations_completed"].as_u64().unwrap();
    let aborted = last["iterations_aborted"].as_u64().unwrap();
    assert_eq!(report.total_iterations(), completed + aborted);
    assert_eq!(report.snapshot.total_iterations(), completed + aborted);
}

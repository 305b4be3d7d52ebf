use std::path::PathBuf;
use std::sync::Arc;

use breeze_core::prelude::{ConfigurationError, ShutdownHandle};

use crate::cli::BreezeScenarioCli;
use crate::config::RunConfig;
use crate::scenario::{Scenario, Step};
use crate::transport::Transport;

/// The builder for a scenario definition.
///
/// This must be used at the start of a scenario binary to define the scenario that you want to
/// run.
pub struct ScenarioDefinitionBuilder {
    /// The name of the scenario, which should be unique within the test suite.
    ///
    /// Recommended value is `env!("CARGO_PKG_NAME")`.
    name: String,
    cli: BreezeScenarioCli,
    /// Used when the command line does not choose a duration or an iteration cap.
    default_duration_s: Option<u64>,
    /// Used when the command line does not choose a number of virtual users.
    default_vus: Option<usize>,
    steps: Vec<Step>,
    /// Send requests through this transport instead of HTTP.
    transport: Option<Arc<dyn Transport>>,
    /// Stop the run from outside, in addition to Ctrl-C and the run duration.
    shutdown_handle: Option<ShutdownHandle>,
    print_summary: bool,
}

pub struct ScenarioDefinition {
    pub name: String,
    pub config: RunConfig,
    pub scenario: Arc<Scenario>,
    pub transport: Option<Arc<dyn Transport>>,
    pub shutdown_handle: ShutdownHandle,
    pub no_progress: bool,
    pub print_summary: bool,
    pub summary_file: Option<PathBuf>,
    pub report_file: Option<PathBuf>,
}

impl ScenarioDefinitionBuilder {
    /// Initialise a new scenario definition from the scenario name and parsed command line
    /// arguments. See [crate::init::init] to parse the command line.
    pub fn new(name: &str, cli: BreezeScenarioCli) -> Self {
        Self {
            name: name.to_string(),
            cli,
            default_duration_s: None,
            default_vus: None,
            steps: Vec::new(),
            transport: None,
            shutdown_handle: None,
            print_summary: true,
        }
    }

    /// Initialise logging, parse the command line and start a new scenario definition.
    pub fn new_with_init(name: &str) -> Self {
        Self::new(name, crate::init::init())
    }

    pub fn with_default_duration_s(mut self, duration_s: u64) -> Self {
        self.default_duration_s = Some(duration_s);
        self
    }

    pub fn with_default_vus(mut self, vus: usize) -> Self {
        self.default_vus = Some(vus);
        self
    }

    /// Append a step. Steps run in the order they are added.
    pub fn add_step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_shutdown_handle(mut self, shutdown_handle: ShutdownHandle) -> Self {
        self.shutdown_handle = Some(shutdown_handle);
        self
    }

    /// Do not print the summary tables at the end of the run.
    pub fn without_summary(mut self) -> Self {
        self.print_summary = false;
        self
    }

    /// Validate the configuration and freeze the scenario. Nothing is started here.
    pub(crate) fn build(self) -> Result<ScenarioDefinition, ConfigurationError> {
        let config = RunConfig::from_cli(&self.cli, self.default_vus, self.default_duration_s)?;
        config.validate()?;

        if self.steps.is_empty() {
            return Err(ConfigurationError::EmptyScenario {
                scenario: self.name,
            });
        }

        let scenario = self
            .steps
            .into_iter()
            .fold(Scenario::new(self.name.clone()), Scenario::step);

        Ok(ScenarioDefinition {
            name: self.name,
            config,
            scenario: Arc::new(scenario),
            transport: self.transport,
            shutdown_handle: self.shutdown_handle.unwrap_or_default(),
            no_progress: self.cli.no_progress,
            print_summary: self.print_summary,
            summary_file: self.cli.summary_file,
            report_file: self.cli.report_file,
        })
    }
}

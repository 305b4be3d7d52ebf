use std::time::{Duration, Instant};

use breeze_core::prelude::ConfigurationError;

use crate::cli::BreezeScenarioCli;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// When a virtual user stops starting new iterations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopCondition {
    /// Stop once this much time has elapsed since the virtual users were started.
    Duration(Duration),
    /// Stop once this virtual user has run this many iterations.
    Iterations(u64),
}

impl StopCondition {
    pub fn is_met(&self, started: Instant, iterations: u64) -> bool {
        match self {
            StopCondition::Duration(duration) => started.elapsed() >= *duration,
            StopCondition::Iterations(cap) => iterations >= *cap,
        }
    }

    pub fn duration(&self) -> Option<Duration> {
        match self {
            StopCondition::Duration(duration) => Some(*duration),
            StopCondition::Iterations(_) => None,
        }
    }

    pub fn iteration_cap(&self) -> Option<u64> {
        match self {
            StopCondition::Duration(_) => None,
            StopCondition::Iterations(cap) => Some(*cap),
        }
    }
}

/// Settings for one run. Fixed once the run has started.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub base_url: String,
    pub virtual_users: usize,
    pub stop_condition: StopCondition,
    /// Replaces every step's pacing delay when set.
    pub sleep_override: Option<Duration>,
    pub request_timeout: Duration,
    /// Spread virtual user start times evenly over this window. All users start at once if unset.
    pub ramp_up: Option<Duration>,
    /// Emit interim snapshots at this interval.
    pub report_interval: Option<Duration>,
}

impl RunConfig {
    pub fn new(
        base_url: impl Into<String>,
        virtual_users: usize,
        stop_condition: StopCondition,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            virtual_users,
            stop_condition,
            sleep_override: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            ramp_up: None,
            report_interval: None,
        }
    }

    /// Build the configuration from the command line, falling back to the scenario's defaults.
    pub fn from_cli(
        cli: &BreezeScenarioCli,
        default_virtual_users: Option<usize>,
        default_duration_s: Option<u64>,
    ) -> Result<Self, ConfigurationError> {
        let stop_condition = match (cli.iterations, cli.duration.or(default_duration_s)) {
            (Some(cap), _) => StopCondition::Iterations(cap),
            (None, Some(duration)) => StopCondition::Duration(Duration::from_secs(duration)),
            (None, None) => return Err(ConfigurationError::NoStopCondition),
        };

        Ok(Self {
            base_url: cli.target_url.clone().unwrap_or_default(),
            virtual_users: cli.vus.or(default_virtual_users).unwrap_or(1),
            stop_condition,
            sleep_override: cli.sleep_ms.map(Duration::from_millis),
            request_timeout: Duration::from_secs(cli.request_timeout_s),
            ramp_up: cli.ramp_up_s.map(Duration::from_secs),
            report_interval: cli.report_interval_s.map(Duration::from_secs),
        })
    }

    pub fn with_sleep_override(mut self, sleep: Duration) -> Self {
        self.sleep_override = Some(sleep);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_ramp_up(mut self, ramp_up: Duration) -> Self {
        self.ramp_up = Some(ramp_up);
        self
    }

    pub fn with_report_interval(mut self, interval: Duration) -> Self {
        self.report_interval = Some(interval);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.virtual_users == 0 {
            return Err(ConfigurationError::NoVirtualUsers);
        }

        match self.stop_condition {
            StopCondition::Duration(duration) if duration.is_zero() => {
                return Err(ConfigurationError::NoStopCondition)
            }
            StopCondition::Iterations(0) => return Err(ConfigurationError::NoStopCondition),
            _ => {}
        }

        if self.base_url.trim().is_empty() {
            return Err(ConfigurationError::EmptyBaseUrl);
        }
        url::Url::parse(&self.base_url).map_err(|e| ConfigurationError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;

        if self.request_timeout.is_zero() {
            return Err(ConfigurationError::ZeroRequestTimeout);
        }

        if self.report_interval.is_some_and(|interval| interval.is_zero()) {
            return Err(ConfigurationError::ZeroReportInterval);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn valid() -> RunConfig {
        RunConfig::new(
            "http://localhost:3000/api",
            40,
            StopCondition::Duration(Duration::from_secs(10)),
        )
    }

    #[test]
    fn valid_config_passes() {
        assert_eq!(Ok(()), valid().validate());
        assert_eq!(DEFAULT_REQUEST_TIMEOUT, valid().request_timeout);
    }

    #[test]
    fn rejects_invalid_configs() {
        let mut config = valid();
        config.virtual_users = 0;
        assert_eq!(Err(ConfigurationError::NoVirtualUsers), config.validate());

        let mut config = valid();
        config.stop_condition = StopCondition::Duration(Duration::ZERO);
        assert_eq!(Err(ConfigurationError::NoStopCondition), config.validate());

        let mut config = valid();
        config.stop_condition = StopCondition::Iterations(0);
        assert_eq!(Err(ConfigurationError::NoStopCondition), config.validate());

        let mut config = valid();
        config.base_url = "  ".to_string();
        assert_eq!(Err(ConfigurationError::EmptyBaseUrl), config.validate());

        let mut config = valid();
        config.base_url = "localhost without scheme".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidBaseUrl { .. })
        ));

        let config = valid().with_request_timeout(Duration::ZERO);
        assert_eq!(Err(ConfigurationError::ZeroRequestTimeout), config.validate());

        let config = valid().with_report_interval(Duration::ZERO);
        assert_eq!(Err(ConfigurationError::ZeroReportInterval), config.validate());
    }

    #[test]
    fn stop_conditions() {
        let started = Instant::now();

        assert!(!StopCondition::Iterations(5).is_met(started, 4));
        assert!(StopCondition::Iterations(5).is_met(started, 5));
        assert!(!StopCondition::Duration(Duration::from_secs(60)).is_met(started, 1_000));
        assert!(StopCondition::Duration(Duration::ZERO).is_met(started, 0));
    }

    #[test]
    fn cli_iterations_take_precedence_over_duration() {
        let cli = BreezeScenarioCli::parse_from([
            "post_flow",
            "--target-url",
            "http://localhost:3000/api",
            "--iterations",
            "5",
            "--duration",
            "10",
            "--vus",
            "3",
        ]);

        let config = RunConfig::from_cli(&cli, None, Some(60)).unwrap();

        assert_eq!(StopCondition::Iterations(5), config.stop_condition);
        assert_eq!(3, config.virtual_users);
    }

    #[test]
    fn cli_falls_back_to_scenario_defaults() {
        let cli = BreezeScenarioCli::parse_from([
            "post_flow",
            "--target-url",
            "http://localhost:3000/api",
            "--sleep-ms",
            "250",
        ]);

        let config = RunConfig::from_cli(&cli, Some(40), Some(10)).unwrap();

        assert_eq!(40, config.virtual_users);
        assert_eq!(
            StopCondition::Duration(Duration::from_secs(10)),
            config.stop_condition
        );
        assert_eq!(Some(Duration::from_millis(250)), config.sleep_override);
        assert_eq!(DEFAULT_REQUEST_TIMEOUT, config.request_timeout);
    }

    #[test]
    fn cli_without_any_stop_condition_is_rejected() {
        let cli = BreezeScenarioCli::parse_from(["post_flow", "--target-url", "http://x"]);

        assert_eq!(
            Err(ConfigurationError::NoStopCondition),
            RunConfig::from_cli(&cli, None, None)
        );
    }
}

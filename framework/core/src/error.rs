//! Error taxonomy shared by the runner and the instruments.
//!
//! Only [ConfigurationError] is fatal to a run. Everything else is absorbed into counters by the
//! metric collector and surfaces in the final report.

/// The run configuration was rejected before any virtual user was started.
#[derive(derive_more::Error, derive_more::Display, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[display("at least one virtual user is required")]
    NoVirtualUsers,
    #[display("either a duration or an iteration cap greater than zero is required")]
    NoStopCondition,
    #[display("the target base URL must not be empty")]
    EmptyBaseUrl,
    #[display("the target base URL [{url}] is invalid: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[display("the request timeout must be greater than zero")]
    ZeroRequestTimeout,
    #[display("the interim report interval must be greater than zero")]
    ZeroReportInterval,
    #[display("the scenario [{scenario}] has no steps")]
    EmptyScenario { scenario: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestErrorKind {
    Timeout,
    Connect,
    Other,
}

/// The request could not be completed, so no response is available to check.
#[derive(derive_more::Error, derive_more::Display, Debug, Clone, PartialEq, Eq)]
#[display("{kind:?}: {message}")]
pub struct RequestError {
    pub kind: RequestErrorKind,
    pub message: String,
}

impl RequestError {
    pub fn new(kind: RequestErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == RequestErrorKind::Timeout
    }
}

/// Why a single step did not succeed.
#[derive(derive_more::Error, derive_more::Display, Debug, Clone, PartialEq, Eq)]
pub enum StepError {
    #[display("request for step [{step}] failed: {source}")]
    Request { step: String, source: RequestError },
    #[display("check [{check}] failed for step [{step}]")]
    Check { step: String, check: String },
    #[display("step [{step}] needs context key [{key}] which no earlier step provided")]
    ContextMissingKey { step: String, key: String },
}

/// A duration that cannot be a latency: negative, NaN or infinite.
#[derive(derive_more::Error, derive_more::Display, Debug, Clone, PartialEq)]
#[display("malformed sample for metric [{metric}]: {value}")]
pub struct MalformedSample {
    pub metric: String,
    pub value: f64,
}

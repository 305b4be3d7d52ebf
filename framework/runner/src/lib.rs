//! Drives virtual users through an HTTP scenario and reports on what they measured.
//!
//! A scenario binary describes its steps with a [prelude::ScenarioDefinitionBuilder] and hands it
//! to [prelude::run]. The run controller validates the configuration, starts the virtual user
//! scheduler, waits for every virtual user to finish its last iteration and reports the final
//! metrics.

mod cli;
mod config;
mod context;
mod definition;
mod executor;
mod init;
mod monitor;
mod progress;
mod run;
mod scenario;
mod scheduler;
mod shutdown;
mod template;
mod transport;
mod types;
mod workflow;

pub mod prelude {
    pub use crate::cli::BreezeScenarioCli;
    pub use crate::config::{RunConfig, StopCondition, DEFAULT_REQUEST_TIMEOUT};
    pub use crate::context::IterationContext;
    pub use crate::definition::{ScenarioDefinition, ScenarioDefinitionBuilder};
    pub use crate::executor::Executor;
    pub use crate::init::init;
    pub use crate::run::{run, RunReport};
    pub use crate::scenario::{Check, CheckFn, Extractor, Method, RequestTemplate, Scenario, Step};
    pub use crate::scheduler::{RunningUsers, VirtualUserScheduler, VirtualUserSummary};
    pub use crate::transport::{HttpTransport, PreparedRequest, StepResponse, Transport};
    pub use crate::types::BreezeResult;
    pub use crate::workflow::{IterationOutcome, StepOutcome, WorkflowRunner, WorkflowState};

    pub use async_trait::async_trait;
    pub use breeze_core::prelude::*;
    pub use breeze_instruments::{
        CheckSummary, DurationStats, MetricCollector, MetricsSnapshot, TrendSummary,
    };
}

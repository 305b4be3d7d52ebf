use std::sync::Arc;
use std::time::Duration;

use breeze_core::prelude::StepError;
use breeze_instruments::{MetricCollector, Sample};

use crate::context::IterationContext;
use crate::scenario::{Scenario, Step};
use crate::template::{render, render_json};
use crate::transport::{PreparedRequest, StepResponse, Transport};

/// Where an iteration is in its scenario.
///
/// `Ready → Running(0) → … → Running(n-1) → Completed`, leaving early for `Aborted` when a step
/// returns [StepOutcome::Abort].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Ready,
    Running(usize),
    Completed,
    Aborted { step: usize },
}

impl WorkflowState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowState::Completed | WorkflowState::Aborted { .. })
    }
}

/// The result of one step, consumed by the iteration loop.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Continue,
    Abort(StepError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IterationOutcome {
    pub vu_id: usize,
    pub iteration_id: u64,
    /// Always [WorkflowState::Completed] or [WorkflowState::Aborted].
    pub state: WorkflowState,
    /// Number of steps entered, including the step that aborted. A step that aborted on a missing
    /// context key counts even though it sent no request.
    pub steps_run: usize,
    pub abort_reason: Option<StepError>,
}

impl IterationOutcome {
    pub fn is_aborted(&self) -> bool {
        matches!(self.state, WorkflowState::Aborted { .. })
    }
}

/// Executes the scenario once per call, recording every step into the metric collector.
pub struct WorkflowRunner {
    scenario: Arc<Scenario>,
    transport: Arc<dyn Transport>,
    collector: Arc<MetricCollector>,
    base_url: String,
    sleep_override: Option<Duration>,
}

impl WorkflowRunner {
    pub fn new(
        scenario: Arc<Scenario>,
        transport: Arc<dyn Transport>,
        collector: Arc<MetricCollector>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            scenario,
            transport,
            collector,
            base_url: base_url.into(),
            sleep_override: None,
        }
    }

    pub fn with_sleep_override(mut self, sleep: Option<Duration>) -> Self {
        self.sleep_override = sleep;
        self
    }

    pub fn scenario(&self) -> &Arc<Scenario> {
        &self.scenario
    }

    pub fn collector(&self) -> &Arc<MetricCollector> {
        &self.collector
    }

    /// Run every step in order until the scenario completes or a step aborts the iteration.
    ///
    /// The context is consumed, so nothing extracted during this iteration outlives it.
    pub async fn run_iteration(&self, mut context: IterationContext) -> IterationOutcome {
        let mut state = WorkflowState::Ready;
        let mut abort_reason = None;
        let mut steps_run = 0;

        let steps = self.scenario.steps();
        for (index, step) in steps.iter().enumerate() {
            state = WorkflowState::Running(index);
            steps_run += 1;

            match self.run_step(step, &mut context).await {
                // No pacing after the last step, the next iteration starts straight away.
                StepOutcome::Continue if index + 1 == steps.len() => {}
                StepOutcome::Continue => self.pace(step).await,
                StepOutcome::Abort(reason) => {
                    log::debug!(
                        "vu-{} aborted iteration {}: {}",
                        context.vu_id(),
                        context.iteration_id(),
                        reason
                    );
                    state = WorkflowState::Aborted { step: index };
                    abort_reason = Some(reason);
                    break;
                }
            }
        }

        if !state.is_terminal() {
            state = WorkflowState::Completed;
        }

        self.collector.record_iteration(abort_reason.is_some());

        IterationOutcome {
            vu_id: context.vu_id(),
            iteration_id: context.iteration_id(),
            state,
            steps_run,
            abort_reason,
        }
    }

    async fn run_step(&self, step: &Step, context: &mut IterationContext) -> StepOutcome {
        let request = match self.prepare(step, context) {
            Ok(request) => request,
            Err(e) => return StepOutcome::Abort(e),
        };

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(e) => {
                log::trace!("Request for step [{}] failed: {}", step.name(), e);
                self.collector.record_request(true);
                self.collector.record_request_error(step.metric_name());

                return if step.is_required() {
                    StepOutcome::Abort(StepError::Request {
                        step: step.name().to_string(),
                        source: e,
                    })
                } else {
                    StepOutcome::Continue
                };
            }
        };

        self.collector.record_sample(
            Sample::new(
                step.metric_name(),
                response.elapsed().as_micros() as f64 / 1000.0,
            )
            .with_tag("vu", context.vu_id())
            .with_tag("status", response.status()),
        );
        self.collector.record_request(!response.is_success());

        let passed = step.check().evaluate(&response);
        self.collector.record_check(step.check().name(), passed);

        extract(step, &response, context);

        if !passed && step.is_required() {
            return StepOutcome::Abort(StepError::Check {
                step: step.name().to_string(),
                check: step.check().name().to_string(),
            });
        }

        StepOutcome::Continue
    }

    fn prepare(
        &self,
        step: &Step,
        context: &IterationContext,
    ) -> Result<PreparedRequest, StepError> {
        let missing_key = |key: String| StepError::ContextMissingKey {
            step: step.name().to_string(),
            key,
        };

        let template = step.request();
        let path = render(&template.url, context).map_err(missing_key)?;
        let body = template
            .body
            .as_ref()
            .map(|body| render_json(body, context))
            .transpose()
            .map_err(missing_key)?;

        Ok(PreparedRequest {
            method: template.method,
            url: join_url(&self.base_url, &path),
            body,
            headers: template.headers.clone(),
        })
    }

    async fn pace(&self, step: &Step) {
        let delay = self.sleep_override.unwrap_or(step.delay());
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

fn extract(step: &Step, response: &StepResponse, context: &mut IterationContext) {
    if step.extractors().is_empty() {
        return;
    }

    let Some(body) = response.json() else {
        log::trace!("Step [{}] response is not JSON, nothing extracted", step.name());
        return;
    };

    for extractor in step.extractors() {
        match body.pointer(&extractor.pointer) {
            Some(value) => context.insert(extractor.key.clone(), value.clone()),
            None => log::trace!(
                "Step [{}] response has no value at {}",
                step.name(),
                extractor.pointer
            ),
        }
    }
}

/// Absolute URLs are used as they are, anything else is appended to the base URL.
fn join_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }

    match path.trim_start_matches('/') {
        "" => base_url.to_string(),
        path => format!("{}/{}", base_url.trim_end_matches('/'), path),
    }
}

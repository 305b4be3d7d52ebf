use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use breeze_core::prelude::{DelegatedShutdownListener, ShutdownHandle};
use tokio::task::JoinHandle;

use crate::config::StopCondition;
use crate::context::IterationContext;
use crate::workflow::WorkflowRunner;

/// What one virtual user did before it exited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VirtualUserSummary {
    pub vu_id: usize,
    pub completed: u64,
    pub aborted: u64,
}

impl VirtualUserSummary {
    pub fn iterations(&self) -> u64 {
        self.completed + self.aborted
    }
}

/// Runs a pool of virtual users, each looping over the scenario until its stop condition is met
/// or the shutdown signal is sent.
///
/// Virtual users are tasks on the current tokio runtime, so there can be many more of them than
/// worker threads. They only share the read-only scenario and the metric collector.
pub struct VirtualUserScheduler {
    runner: Arc<WorkflowRunner>,
    shutdown_handle: ShutdownHandle,
    ramp_up: Option<Duration>,
}

impl VirtualUserScheduler {
    pub fn new(runner: Arc<WorkflowRunner>, shutdown_handle: ShutdownHandle) -> Self {
        Self {
            runner,
            shutdown_handle,
            ramp_up: None,
        }
    }

    /// Stagger virtual user start times evenly across `ramp_up` instead of starting them all at
    /// once.
    pub fn with_ramp_up(mut self, ramp_up: Option<Duration>) -> Self {
        self.ramp_up = ramp_up;
        self
    }

    /// Start `virtual_users` virtual users. Must be called from within a tokio runtime.
    pub fn start(&self, virtual_users: usize, stop_condition: StopCondition) -> RunningUsers {
        let started = Instant::now();
        let iteration_ids = Arc::new(AtomicU64::new(0));

        log::info!(
            "Starting {} virtual users for scenario [{}]",
            virtual_users,
            self.runner.scenario().name()
        );

        let handles = (0..virtual_users)
            .map(|vu_id| {
                let user = VirtualUser {
                    vu_id,
                    runner: self.runner.clone(),
                    stop_condition,
                    started,
                    start_delay: start_delay(self.ramp_up, vu_id, virtual_users),
                    iteration_ids: iteration_ids.clone(),
                    shutdown_listener: self.shutdown_handle.new_listener(),
                };
                tokio::spawn(user.run())
            })
            .collect();

        RunningUsers { handles }
    }
}

/// Handles to the virtual users started by [VirtualUserScheduler::start].
pub struct RunningUsers {
    handles: Vec<JoinHandle<VirtualUserSummary>>,
}

impl RunningUsers {
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait for every virtual user to exit. A virtual user that panicked is logged and left out of
    /// the result.
    pub async fn join(self) -> Vec<VirtualUserSummary> {
        futures::future::join_all(self.handles)
            .await
            .into_iter()
            .filter_map(|result| match result {
                Ok(summary) => Some(summary),
                Err(e) => {
                    log::error!("Virtual user failed: {:?}", e);
                    None
                }
            })
            .collect()
    }
}

struct VirtualUser {
    vu_id: usize,
    runner: Arc<WorkflowRunner>,
    stop_condition: StopCondition,
    started: Instant,
    start_delay: Duration,
    iteration_ids: Arc<AtomicU64>,
    shutdown_listener: DelegatedShutdownListener,
}

impl VirtualUser {
    async fn run(mut self) -> VirtualUserSummary {
        let mut summary = VirtualUserSummary {
            vu_id: self.vu_id,
            ..Default::default()
        };

        if !self.start_delay.is_zero() {
            tokio::select! {
                _ = tokio::time::sleep(self.start_delay) => {}
                _ = self.shutdown_listener.wait_for_shutdown() => {
                    log::debug!("vu-{} stopped before starting", self.vu_id);
                    return summary;
                }
            }
        }

        loop {
            if self.shutdown_listener.should_shutdown() {
                log::debug!("Stopping vu-{} on shutdown", self.vu_id);
                break;
            }
            if self
                .stop_condition
                .is_met(self.started, summary.iterations())
            {
                log::debug!("Stopping vu-{}, stop condition met", self.vu_id);
                break;
            }

            let iteration_id = self.iteration_ids.fetch_add(1, Ordering::Relaxed);
            let outcome = self
                .runner
                .run_iteration(IterationContext::new(self.vu_id, iteration_id))
                .await;

            if outcome.is_aborted() {
                summary.aborted += 1;
            } else {
                summary.completed += 1;
            }

            // Let other virtual users run even if every step of this one completed immediately.
            tokio::task::yield_now().await;
        }

        summary
    }
}

fn start_delay(ramp_up: Option<Duration>, vu_id: usize, virtual_users: usize) -> Duration {
    match ramp_up {
        Some(ramp_up) if virtual_users > 0 => ramp_up.mul_f64(vu_id as f64 / virtual_users as f64),
        _ => Duration::ZERO,
    }
}

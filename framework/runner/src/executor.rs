use std::future::Future;

use breeze_core::prelude::ShutdownHandle;

/// Owns the tokio runtime that virtual users and background tasks run on.
#[derive(Debug)]
pub struct Executor {
    runtime: tokio::runtime::Runtime,
    shutdown_handle: ShutdownHandle,
}

impl Executor {
    pub(crate) fn new(runtime: tokio::runtime::Runtime, shutdown_handle: ShutdownHandle) -> Self {
        Self {
            runtime,
            shutdown_handle,
        }
    }

    /// Run async code in place, blocking until it completes.
    ///
    /// Unlike background tasks the future is not cancelled by the shutdown signal. It is expected to
    /// observe the signal itself and wind down, which is how the run waits for in-flight iterations
    /// to finish.
    pub fn execute_in_place<T>(&self, fut: impl Future<Output = T>) -> T {
        self.runtime.block_on(fut)
    }

    /// Submit async code to be run in the background. The future is dropped at its next suspension
    /// point once the shutdown signal is sent.
    pub fn spawn(&self, fut: impl Future<Output = ()> + Send + 'static) {
        let mut shutdown_listener = self.shutdown_handle.new_listener();
        self.runtime.spawn(async move {
            tokio::select! {
                _ = fut => {},
                _ = shutdown_listener.wait_for_shutdown() => {},
            }
        });
    }

    pub fn runtime(&self) -> &tokio::runtime::Runtime {
        &self.runtime
    }

    pub fn shutdown_handle(&self) -> &ShutdownHandle {
        &self.shutdown_handle
    }
}

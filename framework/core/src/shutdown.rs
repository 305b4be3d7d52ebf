use std::sync::Arc;

use tokio::sync::watch::{Receiver, Sender};

/// Broadcasts the stop signal for a run.
///
/// Sources of the signal are the run duration timer, Ctrl-C, and the run controller once every
/// virtual user has exited. The signal is level-triggered: once sent, every listener observes it
/// for the rest of the run, no matter when the listener was created or how often it is polled.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    sender: Arc<Sender<bool>>,
}

impl Default for ShutdownHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownHandle {
    pub fn new() -> Self {
        Self {
            sender: Arc::new(tokio::sync::watch::channel(false).0),
        }
    }

    pub fn shutdown(&self) {
        let previous = self.sender.send_replace(true);
        if !previous {
            log::debug!("Shutdown signal sent");
        }
    }

    pub fn is_shutdown(&self) -> bool {
        *self.sender.borrow()
    }

    pub fn new_listener(&self) -> DelegatedShutdownListener {
        DelegatedShutdownListener::new(self.sender.subscribe())
    }
}

#[derive(Clone, Debug)]
pub struct DelegatedShutdownListener {
    receiver: Receiver<bool>,
}

impl DelegatedShutdownListener {
    pub(crate) fn new(receiver: Receiver<bool>) -> Self {
        Self { receiver }
    }

    /// Point in time check if the shutdown signal has been sent. Virtual users call this between
    /// iterations, never in the middle of one.
    pub fn should_shutdown(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Wait for the shutdown signal. It is safe to race this with another future so that the
    /// shutdown signal can be used to cancel background work such as interim reporting.
    pub async fn wait_for_shutdown(&mut self) {
        if self.receiver.wait_for(|stopped| *stopped).await.is_err() {
            // Every handle has been dropped, nothing can send the signal any more.
            log::trace!("Shutdown handle dropped, treating as shutdown");
        }
    }
}

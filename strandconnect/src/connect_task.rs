//! Cooperative connect state machine.
//!
//! `Initiate -> ObtainSocket -> Finished`. Each call to [`ConnectTask::step`]
//! runs exactly one state and tells the scheduler what to do next; the task
//! never blocks. [`ConnectTask::run`] is the tokio driver.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use strandvirtual::{ConnectionSubmission, Interface, IoMode, IoStream, ThroughputCaps};

use crate::configure::configure_stream;
use crate::error::{ConnectError, Result};

/// Where a connect task currently is.
pub enum ConnectState {
    /// Submit the attempt through `connect_non_blocking`.
    Initiate,
    /// Wait for the submission to produce a stream.
    ObtainSocket(Arc<ConnectionSubmission>),
    /// Produced a stream or failed; further steps are errors.
    Finished,
}

impl ConnectState {
    /// Human-readable label for the current state (used in logs).
    pub fn label(&self) -> &'static str {
        match self {
            ConnectState::Initiate => "Initiate",
            ConnectState::ObtainSocket(_) => "ObtainSocket",
            ConnectState::Finished => "Finished",
        }
    }
}

impl fmt::Debug for ConnectState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Scheduler instruction returned by one step.
pub enum Step {
    /// State changed; step again right away.
    Yield,
    /// Nothing to do yet; step again after the given delay.
    RetryAfter(Duration),
    /// Configured stream, ready for the caller.
    Ready(Arc<dyn IoStream>),
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Yield => write!(f, "Yield"),
            Step::RetryAfter(delay) => write!(f, "RetryAfter({delay:?})"),
            Step::Ready(_) => write!(f, "Ready"),
        }
    }
}

/// One cooperative connect attempt against an interface.
///
/// The `timeout` recorded at creation is advisory: the task itself never
/// gives up. Schedulers that need a deadline enforce it themselves, e.g. with
/// `tokio::time::timeout(task.timeout(), task.run())`.
pub struct ConnectTask {
    interface: Arc<dyn Interface>,
    caps: ThroughputCaps,
    poll_interval: Duration,
    timeout: Duration,
    state: ConnectState,
    /// Steps that ended in `RetryAfter`.
    retries: u32,
}

impl ConnectTask {
    /// Create a task in the `Initiate` state.
    pub fn new(
        interface: Arc<dyn Interface>,
        caps: ThroughputCaps,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            interface,
            caps,
            poll_interval,
            timeout,
            state: ConnectState::Initiate,
            retries: 0,
        }
    }

    /// Current state.
    pub fn state(&self) -> &ConnectState {
        &self.state
    }

    /// Timeout the task was created with (not enforced by the task).
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Number of retry suspensions so far.
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Whether the task has produced its result.
    pub fn is_finished(&self) -> bool {
        matches!(self.state, ConnectState::Finished)
    }

    /// Run the current state once.
    ///
    /// Errors are terminal: the task moves to `Finished` and later steps fail
    /// with [`ConnectError::TaskFinished`].
    pub fn step(&mut self) -> Result<Step> {
        match std::mem::replace(&mut self.state, ConnectState::Finished) {
            ConnectState::Initiate => match self.interface.connect_non_blocking() {
                Some(submission) => {
                    self.state = ConnectState::ObtainSocket(submission);
                    Ok(Step::Yield)
                }
                None => {
                    self.state = ConnectState::Initiate;
                    Ok(self.retry())
                }
            },
            ConnectState::ObtainSocket(submission) => {
                if !submission.is_valid() || submission.is_closed() {
                    tracing::debug!(
                        interface = %self.interface.name(),
                        retries = self.retries,
                        "cooperative connect failed"
                    );
                    return Err(ConnectError::failed(self.interface.name()));
                }
                match submission.get_socket_non_blocking() {
                    Some(socket) => {
                        configure_stream(socket.as_ref(), IoMode::Asynchronous, self.caps);
                        Ok(Step::Ready(socket))
                    }
                    None => {
                        self.state = ConnectState::ObtainSocket(submission);
                        Ok(self.retry())
                    }
                }
            }
            ConnectState::Finished => Err(ConnectError::TaskFinished),
        }
    }

    fn retry(&mut self) -> Step {
        self.retries = self.retries.saturating_add(1);
        tracing::trace!(
            interface = %self.interface.name(),
            state = self.state.label(),
            delay = ?self.poll_interval,
            "connect pending, retrying"
        );
        Step::RetryAfter(self.poll_interval)
    }

    /// Drive the task to completion on the current tokio runtime.
    pub async fn run(mut self) -> Result<Arc<dyn IoStream>> {
        loop {
            match self.step()? {
                Step::Yield => tokio::task::yield_now().await,
                Step::RetryAfter(delay) => tokio::time::sleep(delay).await,
                Step::Ready(stream) => return Ok(stream),
            }
        }
    }
}

impl fmt::Debug for ConnectTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectTask")
            .field("interface", &self.interface.name())
            .field("state", &self.state)
            .field("retries", &self.retries)
            .finish()
    }
}

/// A task dropped while its submission is pending (for example by an outer
/// timeout) withdraws the submission so no listener accepts it.
impl Drop for ConnectTask {
    fn drop(&mut self) {
        if let ConnectState::ObtainSocket(submission) = &self.state {
            if submission.is_pending() {
                tracing::debug!(
                    interface = %self.interface.name(),
                    retries = self.retries,
                    "connect task dropped, withdrawing submission"
                );
            }
            submission.close();
        }
    }
}

//! Client connection provider for a virtual interface.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use strandvirtual::{ConnectionSubmission, Interface, IoMode, IoStream, ThroughputCaps};

use crate::config::ProviderConfig;
use crate::configure::configure_stream;
use crate::connect_task::ConnectTask;
use crate::error::{ConnectError, Result};
use crate::handoff::Handoff;
use crate::properties::{Properties, PLACEHOLDER_PORT, PROPERTY_HOST, PROPERTY_PORT};

/// Produces configured client streams from one virtual interface.
///
/// The provider itself is immutable while connecting: every attempt
/// snapshots the throughput caps, so concurrent attempts never interfere.
pub struct ConnectionProvider {
    interface: Arc<dyn Interface>,
    config: ProviderConfig,
    properties: Properties,
}

impl ConnectionProvider {
    /// Create a provider with default configuration (unlimited caps, 100 ms
    /// poll interval).
    pub fn new(interface: Arc<dyn Interface>) -> Self {
        Self::with_config(interface, ProviderConfig::default())
    }

    /// Create a provider with an explicit configuration.
    pub fn with_config(interface: Arc<dyn Interface>, config: ProviderConfig) -> Self {
        let mut properties = Properties::new();
        properties.set(PROPERTY_HOST, interface.name());
        properties.set(PROPERTY_PORT, PLACEHOLDER_PORT);
        Self {
            interface,
            config,
            properties,
        }
    }

    /// Create a provider already wrapped for sharing.
    pub fn shared(interface: Arc<dyn Interface>) -> Arc<Self> {
        Arc::new(Self::new(interface))
    }

    /// The interface this provider connects to.
    pub fn interface(&self) -> &Arc<dyn Interface> {
        &self.interface
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Host/port properties for generic client configuration code.
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key)
    }

    /// Caps applied to streams produced from now on.
    pub fn throughput(&self) -> ThroughputCaps {
        self.config.throughput
    }

    /// Set the read/write caps for subsequently produced streams. `-1` means
    /// unlimited.
    pub fn set_max_available_to_read_write(&mut self, max_read: i64, max_write: i64) {
        self.config.throughput = ThroughputCaps::new(max_read, max_write);
    }

    /// Lifecycle hook; the provider holds no background resources.
    pub fn stop(&self) {
        tracing::debug!(interface = %self.interface.name(), "connection provider stopped");
    }

    /// Connect and return a stream in blocking I/O mode.
    ///
    /// A zero `timeout` connects on the calling thread and fails with
    /// [`ConnectError::ConnectionFailed`] if the interface refuses. A positive
    /// `timeout` connects on a worker thread: `Ok(None)` means no connection
    /// arrived in time. On expiry the worker's submission is closed, so the
    /// listener never accepts it and the worker exits; a stream that was
    /// produced anyway is closed and dropped.
    pub fn get(&self, timeout: Duration) -> Result<Option<Arc<dyn IoStream>>> {
        let caps = self.config.throughput;
        if timeout.is_zero() {
            let submission = self.interface.connect();
            return self.report(obtain_blocking(self.interface.as_ref(), &submission, caps));
        }

        let handoff = Arc::new(Handoff::new());
        let in_flight = Arc::new(InFlight::default());
        let worker_handoff = Arc::clone(&handoff);
        let worker_in_flight = Arc::clone(&in_flight);
        let interface = Arc::clone(&self.interface);
        thread::Builder::new()
            .name(format!("strand-connect-{}", self.interface.name()))
            .spawn(move || {
                let submission = interface.connect();
                if !worker_in_flight.register(&submission) {
                    tracing::debug!(
                        interface = %interface.name(),
                        "connect withdrawn before submission"
                    );
                    return;
                }
                let result = obtain_blocking(interface.as_ref(), &submission, caps);
                if let Err(late) = worker_handoff.deliver(result) {
                    match late {
                        Ok(stream) => {
                            tracing::debug!(
                                interface = %interface.name(),
                                "closing stream from abandoned connect attempt"
                            );
                            stream.close();
                        }
                        Err(e) => {
                            tracing::debug!(
                                interface = %interface.name(),
                                error = %e,
                                "abandoned connect attempt finished"
                            );
                        }
                    }
                }
            })?;

        match handoff.wait_for(timeout) {
            Some(result) => self.report(result),
            None => {
                in_flight.withdraw();
                tracing::debug!(
                    interface = %self.interface.name(),
                    ?timeout,
                    "no connection within timeout"
                );
                Ok(None)
            }
        }
    }

    fn report(&self, result: Result<Arc<dyn IoStream>>) -> Result<Option<Arc<dyn IoStream>>> {
        if result.is_err() {
            tracing::warn!(interface = %self.interface.name(), "can't connect");
        }
        result.map(Some)
    }

    /// Start a cooperative connect attempt.
    ///
    /// The returned task produces a stream in asynchronous I/O mode. `timeout`
    /// is recorded on the task but not enforced by it.
    pub fn get_async(&self, timeout: Duration) -> ConnectTask {
        ConnectTask::new(
            Arc::clone(&self.interface),
            self.config.throughput,
            self.config.poll_interval,
            timeout,
        )
    }

    /// [`get_async`](Self::get_async) driven on the current tokio runtime.
    pub fn connect_async(
        &self,
        timeout: Duration,
    ) -> impl Future<Output = Result<Arc<dyn IoStream>>> + Send + 'static {
        self.get_async(timeout).run()
    }
}

impl fmt::Debug for ConnectionProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionProvider")
            .field("interface", &self.interface.name())
            .field("config", &self.config)
            .finish()
    }
}

/// Wait for `submission` and put its stream into blocking mode.
fn obtain_blocking(
    interface: &dyn Interface,
    submission: &ConnectionSubmission,
    caps: ThroughputCaps,
) -> Result<Arc<dyn IoStream>> {
    if submission.is_valid() {
        if let Some(socket) = submission.get_socket() {
            configure_stream(socket.as_ref(), IoMode::Blocking, caps);
            return Ok(socket);
        }
    }
    Err(ConnectError::failed(interface.name()))
}

#[derive(Default)]
struct InFlightState {
    submission: Option<Arc<ConnectionSubmission>>,
    withdrawn: bool,
}

/// The worker's submission, reachable by the caller that may give up on it.
#[derive(Default)]
struct InFlight {
    state: Mutex<InFlightState>,
}

impl InFlight {
    /// Worker side. Returns `false` (and closes `submission`) if the caller
    /// already withdrew.
    fn register(&self, submission: &Arc<ConnectionSubmission>) -> bool {
        let mut state = self.state.lock();
        if state.withdrawn {
            submission.close();
            return false;
        }
        state.submission = Some(Arc::clone(submission));
        true
    }

    /// Caller side. Closes the registered submission, waking the worker and
    /// taking the attempt out of the listener's backlog.
    fn withdraw(&self) {
        let mut state = self.state.lock();
        state.withdrawn = true;
        if let Some(submission) = state.submission.take() {
            submission.close();
        }
    }
}

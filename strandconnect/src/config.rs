//! Provider configuration.

use std::time::Duration;

use strandvirtual::ThroughputCaps;

/// Default delay between polls of a pending cooperative connect: 100 ms.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Configuration for a [`ConnectionProvider`](crate::ConnectionProvider).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Caps applied to every stream the provider produces.
    pub throughput: ThroughputCaps,
    /// Retry delay returned by the cooperative state machine while an attempt
    /// is pending. Not grown between retries.
    pub poll_interval: Duration,
}

impl ProviderConfig {
    /// Replace the throughput caps.
    pub fn with_throughput(mut self, throughput: ThroughputCaps) -> Self {
        self.throughput = throughput;
        self
    }

    /// Replace the poll interval.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            throughput: ThroughputCaps::unlimited(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

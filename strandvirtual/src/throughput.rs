//! Per-call throughput caps.
//!
//! A cap bounds how many bytes a single read or write call may move. It is a
//! simulation knob for constrained links, not a rate limiter: there is no
//! notion of time here.

/// Cap value meaning "no limit".
pub const UNLIMITED: i64 = -1;

/// Read and write caps applied to a stream.
///
/// Any negative value behaves like [`UNLIMITED`]. Values are stored verbatim so
/// callers can read back exactly what they configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThroughputCaps {
    /// Maximum bytes returned by one read call.
    pub max_read: i64,
    /// Maximum bytes accepted by one write call.
    pub max_write: i64,
}

impl ThroughputCaps {
    /// Caps with both directions unlimited.
    pub const fn unlimited() -> Self {
        Self {
            max_read: UNLIMITED,
            max_write: UNLIMITED,
        }
    }

    /// Create caps from raw read/write limits.
    pub const fn new(max_read: i64, max_write: i64) -> Self {
        Self {
            max_read,
            max_write,
        }
    }

    /// Whether neither direction is limited.
    pub fn is_unlimited(&self) -> bool {
        self.max_read < 0 && self.max_write < 0
    }

    /// Number of bytes a read of `requested` bytes may actually return.
    pub fn read_limit(&self, requested: usize) -> usize {
        clamp(self.max_read, requested)
    }

    /// Number of bytes a write of `requested` bytes may actually accept.
    pub fn write_limit(&self, requested: usize) -> usize {
        clamp(self.max_write, requested)
    }
}

impl Default for ThroughputCaps {
    fn default() -> Self {
        Self::unlimited()
    }
}

fn clamp(cap: i64, requested: usize) -> usize {
    match usize::try_from(cap) {
        Ok(cap) => requested.min(cap),
        Err(_) => requested,
    }
}

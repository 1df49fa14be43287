//! Connection submissions: the client's handle on one connect attempt.

use std::fmt;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::socket::IoStream;

/// Lifecycle of the submission's socket slot.
enum Slot {
    /// Waiting for a listener to accept.
    Pending,
    /// Accepted; the stream has not been collected yet.
    Ready(Arc<dyn IoStream>),
    /// The stream was handed out.
    Taken,
    /// Resolved without a stream (listener went away).
    Closed,
}

impl Slot {
    fn label(&self) -> &'static str {
        match self {
            Slot::Pending => "Pending",
            Slot::Ready(_) => "Ready",
            Slot::Taken => "Taken",
            Slot::Closed => "Closed",
        }
    }
}

/// One in-flight or resolved connect attempt.
///
/// Validity is fixed at construction: an invalid submission never produces a
/// stream. A valid submission produces at most one stream; once it has been
/// collected, further accessor calls return `None`.
pub struct ConnectionSubmission {
    valid: bool,
    slot: Mutex<Slot>,
    resolved: Condvar,
}

impl ConnectionSubmission {
    /// Create a submission. Invalid submissions start out closed.
    pub fn new(valid: bool) -> Self {
        Self {
            valid,
            slot: Mutex::new(if valid { Slot::Pending } else { Slot::Closed }),
            resolved: Condvar::new(),
        }
    }

    /// Whether the interface accepted this attempt for matching.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Resolve the submission with `socket`.
    ///
    /// Returns `false` (and leaves the submission untouched) if it was already
    /// resolved or is invalid.
    pub fn set_socket(&self, socket: Arc<dyn IoStream>) -> bool {
        let mut slot = self.slot.lock();
        if !matches!(*slot, Slot::Pending) {
            return false;
        }
        *slot = Slot::Ready(socket);
        self.resolved.notify_all();
        true
    }

    /// Resolve the submission without a stream. No-op unless pending.
    pub fn close(&self) {
        let mut slot = self.slot.lock();
        if matches!(*slot, Slot::Pending) {
            *slot = Slot::Closed;
            self.resolved.notify_all();
        }
    }

    /// Block until resolved, then take the stream.
    ///
    /// Returns `None` for invalid or closed submissions, and on every call
    /// after the stream has been taken.
    pub fn get_socket(&self) -> Option<Arc<dyn IoStream>> {
        let mut slot = self.slot.lock();
        while matches!(*slot, Slot::Pending) {
            self.resolved.wait(&mut slot);
        }
        Self::take(&mut slot)
    }

    /// Take the stream if it is ready, without waiting.
    pub fn get_socket_non_blocking(&self) -> Option<Arc<dyn IoStream>> {
        let mut slot = self.slot.lock();
        Self::take(&mut slot)
    }

    /// Whether the attempt is still waiting for a listener.
    pub fn is_pending(&self) -> bool {
        matches!(*self.slot.lock(), Slot::Pending)
    }

    /// Whether the attempt resolved without producing a stream.
    pub fn is_closed(&self) -> bool {
        matches!(*self.slot.lock(), Slot::Closed)
    }

    fn take(slot: &mut Slot) -> Option<Arc<dyn IoStream>> {
        match std::mem::replace(slot, Slot::Taken) {
            Slot::Ready(socket) => Some(socket),
            other => {
                *slot = other;
                None
            }
        }
    }
}

impl fmt::Debug for ConnectionSubmission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSubmission")
            .field("valid", &self.valid)
            .field("slot", &self.slot.lock().label())
            .finish()
    }
}

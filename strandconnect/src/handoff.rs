//! One-shot hand-off slot between a connect worker and a waiting caller.
//!
//! The caller waits with a deadline. If it gives up first, the slot closes and
//! the worker gets its value back from [`Handoff::deliver`] so it can release
//! whatever the value owns.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

enum HandoffState<T> {
    /// Worker still running, caller still waiting.
    Waiting,
    /// Worker finished; value not yet collected.
    Delivered(T),
    /// Caller collected the value or stopped waiting.
    Closed,
}

pub(crate) struct Handoff<T> {
    state: Mutex<HandoffState<T>>,
    delivered: Condvar,
}

impl<T> Handoff<T> {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(HandoffState::Waiting),
            delivered: Condvar::new(),
        }
    }

    /// Worker side. Returns `Err(value)` when nobody is waiting any more.
    pub(crate) fn deliver(&self, value: T) -> std::result::Result<(), T> {
        let mut state = self.state.lock();
        match *state {
            HandoffState::Waiting => {
                *state = HandoffState::Delivered(value);
                self.delivered.notify_one();
                Ok(())
            }
            HandoffState::Delivered(_) | HandoffState::Closed => Err(value),
        }
    }

    /// Caller side. Waits up to `timeout` for the value; on expiry the slot is
    /// closed and `None` is returned.
    pub(crate) fn wait_for(&self, timeout: Duration) -> Option<T> {
        // Deadlines past the end of `Instant` mean "wait forever".
        let deadline = Instant::now().checked_add(timeout);
        let mut state = self.state.lock();
        loop {
            if let HandoffState::Delivered(value) =
                std::mem::replace(&mut *state, HandoffState::Closed)
            {
                return Some(value);
            }
            match deadline {
                Some(deadline) if Instant::now() >= deadline => return None,
                Some(deadline) => {
                    *state = HandoffState::Waiting;
                    self.delivered.wait_until(&mut state, deadline);
                }
                None => {
                    *state = HandoffState::Waiting;
                    self.delivered.wait(&mut state);
                }
            }
        }
    }
}

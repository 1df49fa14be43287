//! Bounded in-memory byte pipe.
//!
//! One writer side, one reader side, a fixed-capacity buffer in between. The
//! I/O mode is supplied per call so the owning socket can switch modes at any
//! time without touching the pipe.

use bytes::{Buf, BytesMut};
use parking_lot::{Condvar, Mutex};

use crate::error::{Result, StrandVirtualError};
use crate::io_mode::IoMode;

/// Default pipe buffer capacity: 64 KB.
pub const DEFAULT_PIPE_CAPACITY: usize = 64 * 1024;

struct PipeState {
    /// Bytes written but not yet read.
    buf: BytesMut,
    /// Cleared by `close()`; never set again.
    open: bool,
}

/// A unidirectional, bounded byte pipe.
pub struct Pipe {
    state: Mutex<PipeState>,
    /// Signalled when data arrives or the pipe closes.
    readable: Condvar,
    /// Signalled when buffer space frees up or the pipe closes.
    writable: Condvar,
    capacity: usize,
}

impl Pipe {
    /// Create a pipe with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_PIPE_CAPACITY)
    }

    /// Create a pipe holding at most `capacity` unread bytes (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            state: Mutex::new(PipeState {
                buf: BytesMut::with_capacity(capacity),
                open: true,
            }),
            readable: Condvar::new(),
            writable: Condvar::new(),
            capacity,
        }
    }

    /// Read up to `out.len()` bytes.
    ///
    /// Returns `Ok(0)` once the pipe is closed and drained. When no data is
    /// buffered, `Blocking` waits for the writer and `Asynchronous` returns
    /// `WouldBlock`.
    pub fn read(&self, out: &mut [u8], mode: IoMode) -> Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }
        let mut state = self.state.lock();
        loop {
            if !state.buf.is_empty() {
                let n = out.len().min(state.buf.len());
                out[..n].copy_from_slice(&state.buf[..n]);
                state.buf.advance(n);
                self.writable.notify_all();
                return Ok(n);
            }
            if !state.open {
                return Ok(0);
            }
            match mode {
                IoMode::Asynchronous => return Err(StrandVirtualError::WouldBlock),
                IoMode::Blocking => self.readable.wait(&mut state),
            }
        }
    }

    /// Write up to `data.len()` bytes, limited by free buffer space.
    ///
    /// Fails with `PipeClosed` once either end has closed the pipe.
    pub fn write(&self, data: &[u8], mode: IoMode) -> Result<usize> {
        if data.is_empty() {
            return Ok(0);
        }
        let mut state = self.state.lock();
        loop {
            if !state.open {
                return Err(StrandVirtualError::PipeClosed);
            }
            let space = self.capacity - state.buf.len();
            if space > 0 {
                let n = data.len().min(space);
                state.buf.extend_from_slice(&data[..n]);
                self.readable.notify_all();
                return Ok(n);
            }
            match mode {
                IoMode::Asynchronous => return Err(StrandVirtualError::WouldBlock),
                IoMode::Blocking => self.writable.wait(&mut state),
            }
        }
    }

    /// Close the pipe and wake every waiter. Idempotent.
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.open = false;
        self.readable.notify_all();
        self.writable.notify_all();
    }

    /// Whether the pipe is still open.
    pub fn is_open(&self) -> bool {
        self.state.lock().open
    }

    /// Number of buffered, unread bytes.
    pub fn available(&self) -> usize {
        self.state.lock().buf.len()
    }

    /// Maximum number of unread bytes the pipe holds.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for Pipe {
    fn default() -> Self {
        Self::new()
    }
}

//! Bidirectional virtual streams.
//!
//! A [`Socket`] is one end of a connected pair: it reads from one [`Pipe`] and
//! writes to another, with the peer holding the same pipes crosswise. Read and
//! write sides carry independent I/O modes; both share one set of
//! [`ThroughputCaps`].

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;
use crate::io_mode::IoMode;
use crate::pipe::{Pipe, DEFAULT_PIPE_CAPACITY};
use crate::throughput::ThroughputCaps;

static NEXT_SOCKET_ID: AtomicU64 = AtomicU64::new(1);

/// A bidirectional byte stream with a settable I/O mode and throughput caps.
///
/// Setters take `&self`: streams are handed around as `Arc<dyn IoStream>` and
/// configured in place before their owner starts using them.
pub trait IoStream: Send + Sync {
    /// Set the I/O mode of the read side.
    fn set_input_io_mode(&self, mode: IoMode);

    /// Set the I/O mode of the write side.
    fn set_output_io_mode(&self, mode: IoMode);

    /// Current I/O mode of the read side.
    fn input_io_mode(&self) -> IoMode;

    /// Current I/O mode of the write side.
    fn output_io_mode(&self) -> IoMode;

    /// Set the per-call read/write caps. `-1` means unlimited.
    fn set_throughput_caps(&self, caps: ThroughputCaps);

    /// Current per-call read/write caps.
    fn throughput_caps(&self) -> ThroughputCaps;

    /// Read into `buf`, returning the byte count (`0` at end of stream).
    fn read(&self, buf: &mut [u8]) -> Result<usize>;

    /// Write from `data`, returning how many bytes were accepted.
    fn write(&self, data: &[u8]) -> Result<usize>;

    /// Close both directions. The peer observes end of stream.
    fn close(&self);
}

/// One end of an in-process connection.
pub struct Socket {
    id: u64,
    input: Arc<Pipe>,
    output: Arc<Pipe>,
    input_mode: AtomicU8,
    output_mode: AtomicU8,
    caps: Mutex<ThroughputCaps>,
}

impl Socket {
    /// Build a socket over existing pipes. Both modes start as `Blocking`,
    /// caps start unlimited.
    pub fn new(input: Arc<Pipe>, output: Arc<Pipe>) -> Self {
        Self {
            id: NEXT_SOCKET_ID.fetch_add(1, Ordering::Relaxed),
            input,
            output,
            input_mode: AtomicU8::new(IoMode::Blocking.as_u8()),
            output_mode: AtomicU8::new(IoMode::Blocking.as_u8()),
            caps: Mutex::new(ThroughputCaps::unlimited()),
        }
    }

    /// Create a connected pair with default pipe capacity.
    pub fn pair() -> (Socket, Socket) {
        Self::pair_with_capacity(DEFAULT_PIPE_CAPACITY)
    }

    /// Create a connected pair; each direction buffers up to `capacity` bytes.
    pub fn pair_with_capacity(capacity: usize) -> (Socket, Socket) {
        let a_to_b = Arc::new(Pipe::with_capacity(capacity));
        let b_to_a = Arc::new(Pipe::with_capacity(capacity));
        let a = Socket::new(Arc::clone(&b_to_a), Arc::clone(&a_to_b));
        let b = Socket::new(a_to_b, b_to_a);
        (a, b)
    }

    /// Process-unique socket identifier.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Whether both directions are still open.
    pub fn is_open(&self) -> bool {
        self.input.is_open() && self.output.is_open()
    }

    /// Bytes buffered on the read side.
    pub fn available(&self) -> usize {
        self.input.available()
    }
}

impl IoStream for Socket {
    fn set_input_io_mode(&self, mode: IoMode) {
        self.input_mode.store(mode.as_u8(), Ordering::Release);
    }

    fn set_output_io_mode(&self, mode: IoMode) {
        self.output_mode.store(mode.as_u8(), Ordering::Release);
    }

    fn input_io_mode(&self) -> IoMode {
        IoMode::from_u8(self.input_mode.load(Ordering::Acquire))
    }

    fn output_io_mode(&self) -> IoMode {
        IoMode::from_u8(self.output_mode.load(Ordering::Acquire))
    }

    fn set_throughput_caps(&self, caps: ThroughputCaps) {
        *self.caps.lock() = caps;
    }

    fn throughput_caps(&self) -> ThroughputCaps {
        *self.caps.lock()
    }

    fn read(&self, buf: &mut [u8]) -> Result<usize> {
        let limit = self.caps.lock().read_limit(buf.len());
        if limit < buf.len() {
            tracing::trace!(socket = self.id, requested = buf.len(), limit, "read capped");
        }
        self.input.read(&mut buf[..limit], self.input_io_mode())
    }

    fn write(&self, data: &[u8]) -> Result<usize> {
        let limit = self.caps.lock().write_limit(data.len());
        if limit < data.len() {
            tracing::trace!(socket = self.id, requested = data.len(), limit, "write capped");
        }
        self.output.write(&data[..limit], self.output_io_mode())
    }

    fn close(&self) {
        self.input.close();
        self.output.close();
    }
}

impl Drop for Socket {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Socket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Socket")
            .field("id", &self.id)
            .field("input_mode", &self.input_io_mode())
            .field("output_mode", &self.output_io_mode())
            .field("caps", &self.throughput_caps())
            .finish()
    }
}

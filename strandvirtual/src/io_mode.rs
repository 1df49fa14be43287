//! Blocking vs. asynchronous I/O mode for virtual streams.

use std::fmt;

/// How a stream's read or write side behaves when it cannot make progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum IoMode {
    /// Park the calling thread until data (or buffer space) is available.
    #[default]
    Blocking = 0x00,
    /// Return `WouldBlock` immediately; the caller's scheduler retries later.
    Asynchronous = 0x01,
}

impl IoMode {
    /// Convert from the raw representation stored in atomics.
    ///
    /// Unknown values decode as `Blocking`.
    pub fn from_u8(v: u8) -> Self {
        match v {
            0x01 => IoMode::Asynchronous,
            _ => IoMode::Blocking,
        }
    }

    /// Raw representation, inverse of [`IoMode::from_u8`].
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for IoMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IoMode::Blocking => write!(f, "Blocking"),
            IoMode::Asynchronous => write!(f, "Asynchronous"),
        }
    }
}

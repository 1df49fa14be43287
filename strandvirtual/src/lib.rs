//! StrandVirtual -- in-process virtual network interfaces for the Strand
//! Protocol stack.
//!
//! A [`VirtualInterface`] is a named rendezvous point standing in for a real
//! listener. Clients submit connect attempts and receive a
//! [`ConnectionSubmission`] handle; the bound listener accepts them and both
//! sides get one half of a pipe-backed [`Socket`].
//!
//! Streams expose two knobs used to simulate different links:
//! - **I/O mode**: blocking calls park the caller, asynchronous calls return
//!   [`StrandVirtualError::WouldBlock`] instead.
//! - **Throughput caps**: an upper bound on bytes moved per read/write call.

pub mod error;
pub mod interface;
pub mod io_mode;
pub mod pipe;
pub mod socket;
pub mod submission;
pub mod throughput;

// Re-export key public types at crate root.
pub use error::{Result, StrandVirtualError};
pub use interface::{Interface, ListenerLock, VirtualInterface};
pub use io_mode::IoMode;
pub use pipe::Pipe;
pub use socket::{IoStream, Socket};
pub use submission::ConnectionSubmission;
pub use throughput::{ThroughputCaps, UNLIMITED};

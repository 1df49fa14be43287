//! StrandConnect -- client connection provider for StrandVirtual interfaces.
//!
//! Turns a named [`strandvirtual::Interface`] into ready-to-use streams via two
//! paths:
//! - **Blocking** ([`ConnectionProvider::get`]): connect on the calling thread,
//!   or on a worker thread bounded by a timeout. Streams come out in
//!   `IoMode::Blocking`.
//! - **Cooperative** ([`ConnectionProvider::get_async`]): a two-state
//!   [`ConnectTask`] that never blocks and asks its scheduler to retry after a
//!   fixed poll interval. Streams come out in `IoMode::Asynchronous`.
//!
//! Both paths apply the provider's throughput caps before handing the stream
//! out.

pub mod config;
pub mod configure;
pub mod connect_task;
pub mod error;
mod handoff;
pub mod properties;
pub mod provider;

// Re-export key public types at crate root.
pub use config::{ProviderConfig, DEFAULT_POLL_INTERVAL};
pub use connect_task::{ConnectState, ConnectTask, Step};
pub use error::{ConnectError, Result};
pub use properties::{Properties, PROPERTY_HOST, PROPERTY_PORT};
pub use provider::ConnectionProvider;

use thiserror::Error;

/// All errors produced by the connection provider.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("can't connect to virtual interface '{interface}'")]
    ConnectionFailed { interface: String },

    #[error("failed to spawn connect worker: {0}")]
    WorkerSpawn(#[from] std::io::Error),

    #[error("connect task already finished")]
    TaskFinished,
}

impl ConnectError {
    pub(crate) fn failed(interface: &str) -> Self {
        ConnectError::ConnectionFailed {
            interface: interface.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConnectError>;

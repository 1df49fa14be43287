use thiserror::Error;

/// All errors produced by the StrandVirtual layer.
#[derive(Debug, Error)]
pub enum StrandVirtualError {
    #[error("operation would block")]
    WouldBlock,

    #[error("pipe is closed")]
    PipeClosed,

    #[error("virtual interface '{0}' already has a listener")]
    AlreadyBound(String),
}

pub type Result<T> = std::result::Result<T, StrandVirtualError>;

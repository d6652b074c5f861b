use thiserror::Error;

/// Failure reported by an outbound transport.
#[derive(Error, Debug, Clone)]
pub enum SinkError {
    #[error("Transport request failed: {0}")]
    Request(String),

    #[error("Destination unreachable: {0}")]
    Unreachable(String),

    #[error("Rejected by transport: {0}")]
    Rejected(String),
}

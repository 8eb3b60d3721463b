//! Queue error types

use thiserror::Error;

/// Errors produced by queue operations
#[derive(Error, Debug)]
pub enum QueueError {
    /// Broker connection or channel operation failed
    #[error("broker error: {0}")]
    Broker(#[from] lapin::Error),

    /// Message could not be serialized or deserialized
    #[error("message serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;

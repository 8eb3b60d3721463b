//! Error handling for the Loopcast worker
//!
//! A single thiserror hierarchy for the media pipeline. Only some of these
//! abort a job: probe and waveform-decode failures are degraded in place by
//! their modules and never surface here.

use std::path::PathBuf;

use thiserror::Error;

/// Worker error type covering the media pipeline
#[derive(Error, Debug)]
pub enum WorkerError {
    // ========== Job Processing Errors ==========
    /// Queue message could not be parsed
    #[error("invalid job data: {0}")]
    InvalidJobData(String),

    /// External process exceeded the configured job timeout
    #[error("job step timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    // ========== Transcoding Errors ==========
    /// FFmpeg binary not found in PATH
    #[error("ffmpeg not found in PATH")]
    FfmpegNotFound,

    /// Encoder rejected the input
    #[error("transcode failed for '{path}': {reason}")]
    Transcode { path: PathBuf, reason: String },

    /// Decoder could not read the input (non-fatal at the pipeline level:
    /// the waveform extractor converts this into the fallback envelope)
    #[error("waveform decode failed for '{path}': {reason}")]
    Decode { path: PathBuf, reason: String },

    // ========== Infrastructure Errors ==========
    /// Database query failed
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Queue operation failed
    #[error("queue error: {0}")]
    Queue(#[from] loopcast_queue::QueueError),

    /// File system access error
    #[error("filesystem error: {0}")]
    Filesystem(#[from] std::io::Error),

    // ========== Internal Errors ==========
    /// Internal worker error (catch-all for unexpected errors)
    #[error("internal worker error: {0}")]
    Internal(String),
}

impl WorkerError {
    /// Create a transcode error
    pub fn transcode(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Transcode {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a decode error
    pub fn decode(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Decode {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether the failure is environmental rather than caused by the input
    ///
    /// Infrastructure failures would fail any job; input failures are
    /// specific to the file being processed.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::Queue(_) | Self::Filesystem(_) | Self::FfmpegNotFound
        )
    }

    /// Log the error with severity matched to its class
    pub fn log(&self) {
        if self.is_infrastructure() {
            tracing::error!(error = %self, "Worker infrastructure error");
        } else {
            tracing::warn!(error = %self, "Job failed");
        }
    }
}

/// Result type for worker operations
pub type WorkerResult<T> = Result<T, WorkerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcode_error_display() {
        let err = WorkerError::transcode("/tmp/in.wav", "unsupported codec");
        assert_eq!(
            err.to_string(),
            "transcode failed for '/tmp/in.wav': unsupported codec"
        );
    }

    #[test]
    fn test_infrastructure_classification() {
        assert!(WorkerError::FfmpegNotFound.is_infrastructure());
        assert!(!WorkerError::transcode("x", "y").is_infrastructure());
        assert!(!WorkerError::Timeout { seconds: 120 }.is_infrastructure());
        assert!(!WorkerError::InvalidJobData("bad".into()).is_infrastructure());
    }
}

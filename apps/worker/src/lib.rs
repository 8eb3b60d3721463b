//! Loopcast media processing worker
//!
//! Long-running consumer of the audio processing queue. Each job transcodes
//! an uploaded loop into its streaming preview, extracts the waveform
//! envelope, probes the true duration, and drives the loop's status
//! lifecycle to a terminal state.

pub mod config;
pub mod error;
pub mod jobs;
pub mod repository;

pub use config::Config;
pub use error::{WorkerError, WorkerResult};

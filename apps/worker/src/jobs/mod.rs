//! Media pipeline job modules
//!
//! One module per pipeline stage:
//! - `process` ties the stages together and drives the status lifecycle
//! - `transcode` produces the fixed-bitrate preview
//! - `waveform` extracts the normalized amplitude envelope
//! - `probe` detects the true duration

pub mod probe;
pub mod process;
pub mod transcode;
pub mod waveform;

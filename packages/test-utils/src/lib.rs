//! Shared test utilities for the Loopcast workspace
//!
//! Provides deterministic audio fixtures and upload-root scaffolding so
//! worker and API tests do not need real uploads or a seeded database.

pub mod wav;

use std::path::Path;

use tempfile::TempDir;

/// Create a temporary upload root with the standard directory layout
/// (`originals/`, `previews/`)
///
/// The directory is removed when the returned guard is dropped.
pub fn temp_upload_root() -> TempDir {
    let root = tempfile::tempdir().expect("failed to create temp upload root");
    std::fs::create_dir_all(root.path().join("originals")).expect("failed to create originals/");
    std::fs::create_dir_all(root.path().join("previews")).expect("failed to create previews/");
    root
}

/// Whether ffmpeg/ffprobe are installed on this machine
///
/// Tests that shell out to the media tools call this first and skip
/// themselves when the tools are absent, instead of failing the suite.
pub fn media_tools_available() -> bool {
    let probe = |bin: &str| {
        std::process::Command::new(bin)
            .arg("-version")
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    };
    probe("ffmpeg") && probe("ffprobe")
}

/// Write a deterministic sine-wave WAV fixture to `path`
pub fn write_sine_wav(
    path: &Path,
    duration_secs: f32,
    sample_rate: u32,
    frequency_hz: f32,
) -> std::io::Result<()> {
    std::fs::write(path, wav::sine_wav_bytes(duration_secs, sample_rate, frequency_hz, 0.8))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_upload_root_layout() {
        let root = temp_upload_root();
        assert!(root.path().join("originals").is_dir());
        assert!(root.path().join("previews").is_dir());
    }
}

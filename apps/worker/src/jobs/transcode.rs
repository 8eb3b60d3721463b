//! Preview transcoding via FFmpeg
//!
//! Every preview is encoded with the same fixed bitrate and codec so that
//! decode cost and streaming bandwidth are predictable across the catalog.
//! The output path is deterministic per loop: `previews/{id}.mp3`.
//!
//! An encoder error is fatal to the job: the lifecycle manager transitions
//! the loop to FAILED and records no preview path.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use uuid::Uuid;

use crate::error::{WorkerError, WorkerResult};

/// Fixed preview bitrate in kbps
pub const PREVIEW_BITRATE_KBPS: u32 = 128;

/// Fixed preview codec
pub const PREVIEW_CODEC: &str = "libmp3lame";

/// Container format and file extension of previews
pub const PREVIEW_EXT: &str = "mp3";

/// Database-relative path of the preview file for a loop
pub fn preview_relative_path(loop_id: Uuid) -> String {
    format!(
        "{}/{}.{}",
        loopcast_shared_config::PREVIEWS_DIR,
        loop_id,
        PREVIEW_EXT
    )
}

/// Re-encode an original upload into the streaming preview format
///
/// Awaits the encoder to completion; exactly one file exists at `output`
/// on success. The invocation is bounded by `timeout` and the child is
/// killed if it expires.
pub async fn transcode_preview(
    input: &Path,
    output: &Path,
    timeout: Duration,
) -> WorkerResult<()> {
    tracing::debug!(
        input = %input.display(),
        output = %output.display(),
        bitrate = PREVIEW_BITRATE_KBPS,
        "Starting preview transcode"
    );

    let mut cmd = Command::new("ffmpeg");
    cmd.arg("-y")
        .arg("-hide_banner")
        .args(["-loglevel", "error"])
        .arg("-i")
        .arg(input)
        .args(["-c:a", PREVIEW_CODEC])
        .args(["-b:a", &format!("{}k", PREVIEW_BITRATE_KBPS)])
        .args(["-f", PREVIEW_EXT])
        .arg(output)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let result = tokio::time::timeout(timeout, cmd.output()).await;

    let output_data = match result {
        Ok(Ok(output_data)) => output_data,
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(WorkerError::FfmpegNotFound);
        }
        Ok(Err(e)) => return Err(WorkerError::transcode(input, e.to_string())),
        Err(_) => {
            return Err(WorkerError::Timeout {
                seconds: timeout.as_secs(),
            });
        }
    };

    if !output_data.status.success() {
        let stderr = String::from_utf8_lossy(&output_data.stderr);
        return Err(WorkerError::transcode(
            input,
            stderr.trim().lines().last().unwrap_or("encoder error"),
        ));
    }

    tracing::debug!(output = %output.display(), "Preview transcode finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_path_is_deterministic() {
        let id = Uuid::parse_str("6f2c0e1a-9a1f-4c53-8dd0-1f9a5f3c2b10").unwrap();
        assert_eq!(
            preview_relative_path(id),
            "previews/6f2c0e1a-9a1f-4c53-8dd0-1f9a5f3c2b10.mp3"
        );
        // Same input, same path
        assert_eq!(preview_relative_path(id), preview_relative_path(id));
    }

    #[test]
    fn test_preview_constants_fixed() {
        assert_eq!(PREVIEW_BITRATE_KBPS, 128);
        assert_eq!(PREVIEW_CODEC, "libmp3lame");
        assert_eq!(PREVIEW_EXT, "mp3");
    }
}

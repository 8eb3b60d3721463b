//! True duration detection via ffprobe
//!
//! The upload-time duration is client-supplied or defaulted; the container
//! itself is authoritative. ffprobe emits the container metadata as JSON
//! and we take `format.duration` from it.
//!
//! Probing is non-fatal: any failure (missing tool, corrupt file, parse
//! error, non-positive value) yields `None` and the lifecycle manager keeps
//! the duration already on the row.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

/// Probe the playback duration of an audio file in seconds
///
/// Returns `None` on any failure; never errors.
pub async fn probe_duration(path: &Path, timeout: Duration) -> Option<f64> {
    let mut cmd = Command::new("ffprobe");
    cmd.args(["-v", "quiet", "-print_format", "json", "-show_format"])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true);

    let output = match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, path = %path.display(), "ffprobe invocation failed");
            return None;
        }
        Err(_) => {
            tracing::warn!(path = %path.display(), "ffprobe timed out");
            return None;
        }
    };

    if !output.status.success() {
        tracing::warn!(
            status = %output.status,
            path = %path.display(),
            "ffprobe exited with error"
        );
        return None;
    }

    let parsed = parse_ffprobe_duration(&String::from_utf8_lossy(&output.stdout));
    if parsed.is_none() {
        tracing::warn!(path = %path.display(), "ffprobe output had no usable duration");
    }
    parsed
}

/// Extract `format.duration` from ffprobe JSON output
///
/// Kept separate from the process invocation so the parsing contract is
/// testable without ffprobe installed. ffprobe reports the duration as a
/// decimal string; a numeric value is tolerated too. Non-positive and
/// non-finite durations are treated as unknown.
pub fn parse_ffprobe_duration(json: &str) -> Option<f64> {
    let value: serde_json::Value = serde_json::from_str(json).ok()?;
    let duration = value.get("format")?.get("duration")?;

    let secs = match duration {
        serde_json::Value::String(s) => s.parse::<f64>().ok()?,
        other => other.as_f64()?,
    };

    (secs.is_finite() && secs > 0.0).then_some(secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_typical_output() {
        let json = r#"{
            "format": {
                "filename": "loop.wav",
                "format_name": "wav",
                "duration": "10.024000",
                "size": "1764044"
            }
        }"#;
        let secs = parse_ffprobe_duration(json).unwrap();
        assert!((secs - 10.024).abs() < 1e-9);
    }

    #[test]
    fn test_parse_numeric_duration() {
        let json = r#"{ "format": { "duration": 4.5 } }"#;
        assert_eq!(parse_ffprobe_duration(json), Some(4.5));
    }

    #[test]
    fn test_missing_format_section() {
        assert_eq!(parse_ffprobe_duration(r#"{ "streams": [] }"#), None);
    }

    #[test]
    fn test_missing_duration_field() {
        assert_eq!(
            parse_ffprobe_duration(r#"{ "format": { "format_name": "wav" } }"#),
            None
        );
    }

    #[test]
    fn test_invalid_json() {
        assert_eq!(parse_ffprobe_duration("not json at all"), None);
        assert_eq!(parse_ffprobe_duration(""), None);
    }

    #[test]
    fn test_non_positive_duration_is_unknown() {
        assert_eq!(
            parse_ffprobe_duration(r#"{ "format": { "duration": "0.0" } }"#),
            None
        );
        assert_eq!(
            parse_ffprobe_duration(r#"{ "format": { "duration": "-3.2" } }"#),
            None
        );
    }

    #[test]
    fn test_unparseable_duration_string() {
        assert_eq!(
            parse_ffprobe_duration(r#"{ "format": { "duration": "N/A" } }"#),
            None
        );
    }
}

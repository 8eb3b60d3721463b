//! Loop model: an uploaded audio loop, its metadata and derived artifacts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Accepted BPM range for uploads
pub const BPM_MIN: i32 = 20;
pub const BPM_MAX: i32 = 300;

/// Accepted loop duration bounds in seconds
pub const DURATION_MIN_SECS: f64 = 1.0;
pub const DURATION_MAX_SECS: f64 = 60.0;

/// Duration recorded when the uploader supplies none; the worker replaces
/// it with the probed value once processing completes
pub const DEFAULT_DURATION_SECS: f64 = 30.0;

/// Container formats the pipeline accepts
pub const SUPPORTED_EXTENSIONS: [&str; 6] = ["wav", "mp3", "ogg", "flac", "aiff", "aif"];

/// Processing lifecycle state, matching the PostgreSQL `loop_status` enum
///
/// A loop is created PENDING at upload time and is mutated only by the
/// worker. It never reverts from READY or FAILED back to PENDING.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "loop_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LoopStatus {
    #[default]
    Pending,
    Processing,
    Ready,
    Failed,
}

impl LoopStatus {
    /// Whether the loop is visible in public listings
    pub fn is_public(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Whether processing has reached a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready | Self::Failed)
    }

    /// Legal forward transition in the processing lifecycle
    pub fn can_transition_to(&self, next: LoopStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing)
                | (Self::Processing, Self::Ready)
                | (Self::Processing, Self::Failed)
        )
    }
}

impl std::str::FromStr for LoopStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "ready" => Ok(Self::Ready),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown loop status: {}", other)),
        }
    }
}

/// Loop record from the loops table
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Loop {
    /// Unique loop identifier
    pub id: Uuid,

    /// URL-friendly unique slug derived from the title
    pub slug: String,

    /// Loop title
    pub title: String,

    /// Optional free-text description
    pub description: Option<String>,

    /// Tempo in beats per minute
    pub bpm: i32,

    /// Musical key (e.g., "C#m")
    #[serde(rename = "key")]
    pub musical_key: Option<String>,

    /// Duration in seconds; authoritative value is probe-corrected after
    /// processing
    pub duration_secs: f64,

    /// Optional genre label
    pub genre: Option<String>,

    // Storage descriptors; paths are relative to the upload root
    /// Path of the original upload
    pub original_file: String,

    /// Path of the streaming preview, present once processing succeeds
    pub preview_file: Option<String>,

    /// Hex SHA-256 of the original bytes, input to download certificates
    pub file_hash: String,

    /// Normalized amplitude envelope, present once processing succeeds.
    /// Populated together with `preview_file` in one write.
    #[sqlx(json(nullable))]
    pub waveform: Option<Vec<f32>>,

    /// Processing lifecycle state
    pub status: LoopStatus,

    /// Uploading user
    pub user_id: Uuid,

    // Aggregate counters maintained by the social endpoints
    pub download_count: i32,
    pub listen_count: i32,
    pub average_rating: f64,
    pub rating_count: i32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Loop joined with its uploader's public profile
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopWithUploader {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub record: Loop,

    pub uploader_username: String,
    pub uploader_avatar_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(LoopStatus::Pending).unwrap(),
            serde_json::json!("pending")
        );
        assert_eq!(
            serde_json::to_value(LoopStatus::Ready).unwrap(),
            serde_json::json!("ready")
        );
    }

    #[test]
    fn test_status_lifecycle_is_linear() {
        use LoopStatus::*;

        assert!(Pending.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Ready));
        assert!(Processing.can_transition_to(Failed));

        // PROCESSING is never skipped
        assert!(!Pending.can_transition_to(Ready));
        assert!(!Pending.can_transition_to(Failed));

        // Terminal states never revert
        for terminal in [Ready, Failed] {
            assert!(terminal.is_terminal());
            for next in [Pending, Processing, Ready, Failed] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_only_ready_is_public() {
        assert!(LoopStatus::Ready.is_public());
        assert!(!LoopStatus::Pending.is_public());
        assert!(!LoopStatus::Processing.is_public());
        assert!(!LoopStatus::Failed.is_public());
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!("ready".parse::<LoopStatus>().unwrap(), LoopStatus::Ready);
        assert_eq!("READY".parse::<LoopStatus>().unwrap(), LoopStatus::Ready);
        assert!("done".parse::<LoopStatus>().is_err());
    }
}

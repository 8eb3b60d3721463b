//! Wire formats for queue messages
//!
//! These types define the JSON shapes shared between the API (producer)
//! and the worker/consumer processes. Field names are serialized in
//! camelCase to match the persisted message format.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of processing requested for an uploaded loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobType {
    /// Full pipeline: preview transcode, waveform envelope, duration probe
    Transcode,
}

/// A unit of asynchronous media processing work
///
/// Ephemeral: its only durable trace is the broker's message store until
/// acknowledged, plus the side effects it causes on the loop row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingJob {
    /// Loop to process
    pub resource_id: Uuid,

    /// Path to the original upload, relative to the upload root
    pub source_file_path: String,

    /// Kind of processing requested
    pub job_type: JobType,
}

impl ProcessingJob {
    /// Create a transcode job for an uploaded loop
    pub fn transcode(resource_id: Uuid, source_file_path: impl Into<String>) -> Self {
        Self {
            resource_id,
            source_file_path: source_file_path.into(),
            job_type: JobType::Transcode,
        }
    }
}

/// Known user-facing event kinds
///
/// Unknown strings deserialize to [`EventType::Unknown`] so that a consumer
/// running an older build never fails on a newer producer's events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventType {
    NewComment,
    NewRating,
    NewDownload,
    ProcessingComplete,
    System,
    #[serde(other)]
    Unknown,
}

/// A user-facing notification event
///
/// Producers publish these only when the acting user is not the recipient
/// (no self-notification). Delivery is at-least-once; a redelivered event
/// may create a duplicate notification row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEvent {
    /// What happened
    pub event_type: EventType,

    /// User who should be notified
    pub recipient_id: Uuid,

    /// Event-specific data (loop id/title, actor username, rating value...)
    pub payload: serde_json::Value,
}

impl NotificationEvent {
    pub fn new(event_type: EventType, recipient_id: Uuid, payload: serde_json::Value) -> Self {
        Self {
            event_type,
            recipient_id,
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_processing_job_wire_shape() {
        let id = Uuid::new_v4();
        let job = ProcessingJob::transcode(id, "originals/abc.wav");
        let value = serde_json::to_value(&job).unwrap();

        assert_eq!(
            value,
            json!({
                "resourceId": id.to_string(),
                "sourceFilePath": "originals/abc.wav",
                "jobType": "transcode",
            })
        );
    }

    #[test]
    fn test_processing_job_round_trip() {
        let job = ProcessingJob::transcode(Uuid::new_v4(), "originals/x.flac");
        let bytes = serde_json::to_vec(&job).unwrap();
        let parsed: ProcessingJob = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed, job);
    }

    #[test]
    fn test_notification_event_wire_shape() {
        let recipient = Uuid::new_v4();
        let event = NotificationEvent::new(
            EventType::NewComment,
            recipient,
            json!({ "loopTitle": "Dusty Break" }),
        );
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["eventType"], "new-comment");
        assert_eq!(value["recipientId"], recipient.to_string());
        assert_eq!(value["payload"]["loopTitle"], "Dusty Break");
    }

    #[test]
    fn test_unknown_event_type_tolerated() {
        let raw = json!({
            "eventType": "new-follower",
            "recipientId": Uuid::new_v4().to_string(),
            "payload": {},
        });
        let event: NotificationEvent = serde_json::from_value(raw).unwrap();
        assert_eq!(event.event_type, EventType::Unknown);
    }

    #[test]
    fn test_event_type_spelling() {
        assert_eq!(
            serde_json::to_value(EventType::ProcessingComplete).unwrap(),
            json!("processing-complete")
        );
        assert_eq!(
            serde_json::to_value(EventType::System).unwrap(),
            json!("system")
        );
    }
}

//! Notification model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use loopcast_queue::EventType;

/// Notification kind, matching the PostgreSQL `notification_type` enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_type", rename_all = "snake_case")]
#[serde(rename_all = "kebab-case")]
pub enum NotificationType {
    NewComment,
    NewRating,
    NewDownload,
    ProcessingComplete,
    System,
}

impl From<EventType> for NotificationType {
    /// Unknown event types are stored as generic system notifications
    /// rather than failing the consumer
    fn from(event_type: EventType) -> Self {
        match event_type {
            EventType::NewComment => Self::NewComment,
            EventType::NewRating => Self::NewRating,
            EventType::NewDownload => Self::NewDownload,
            EventType::ProcessingComplete => Self::ProcessingComplete,
            EventType::System | EventType::Unknown => Self::System,
        }
    }
}

/// Persisted, user-visible notification
///
/// Creation is the terminal effect of a notification event; rows have no
/// further lifecycle beyond the read flag.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub payload: Option<serde_json::Value>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_mapping() {
        assert_eq!(
            NotificationType::from(EventType::NewComment),
            NotificationType::NewComment
        );
        assert_eq!(
            NotificationType::from(EventType::ProcessingComplete),
            NotificationType::ProcessingComplete
        );
        assert_eq!(
            NotificationType::from(EventType::Unknown),
            NotificationType::System
        );
    }

    #[test]
    fn test_kind_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_value(NotificationType::NewComment).unwrap(),
            serde_json::json!("new-comment")
        );
    }
}

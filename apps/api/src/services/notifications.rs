//! Notification dispatch
//!
//! Consumes the notification queue, renders each event into a persisted
//! notification row, and pushes it best-effort over any live websocket
//! connections the recipient holds. Delivery is at-least-once with no
//! dedup key, so a broker redelivery can duplicate a notification row;
//! that is an accepted, non-corrupting outcome.

use std::time::Duration;

use loopcast_queue::{EventType, NotificationEvent, QueueClient, QueueName};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::models::{Notification, NotificationType};
use crate::repositories::NotificationRepository;
use crate::websocket::{ConnectionRegistry, ServerMessage};

/// Producers publish only when the acting user is not the resource owner
pub fn should_notify(actor_id: Uuid, owner_id: Uuid) -> bool {
    actor_id != owner_id
}

/// Render an event into its notification kind, title and message
///
/// The five known event types each have a template; anything else falls
/// back to a generic notification instead of failing the consumer.
pub fn render_event(event: &NotificationEvent) -> (NotificationType, String, String) {
    let loop_title = payload_str(event, "loopTitle", "your loop");

    match event.event_type {
        EventType::NewComment => (
            NotificationType::NewComment,
            "New Comment".to_string(),
            format!(
                "{} commented on \"{}\"",
                payload_str(event, "commenterUsername", "Someone"),
                loop_title
            ),
        ),
        EventType::NewRating => (
            NotificationType::NewRating,
            "New Rating".to_string(),
            match event.payload.get("rating").and_then(|v| v.as_i64()) {
                Some(rating) => {
                    format!("Someone rated \"{}\" with {} stars", loop_title, rating)
                }
                None => format!("Someone rated \"{}\"", loop_title),
            },
        ),
        EventType::NewDownload => (
            NotificationType::NewDownload,
            "Loop Downloaded".to_string(),
            format!(
                "{} downloaded \"{}\"",
                payload_str(event, "downloaderUsername", "Someone"),
                loop_title
            ),
        ),
        EventType::ProcessingComplete => (
            NotificationType::ProcessingComplete,
            "Loop Ready".to_string(),
            format!(
                "Your loop \"{}\" has been processed and is now available",
                loop_title
            ),
        ),
        EventType::System | EventType::Unknown => (
            NotificationType::System,
            "Notification".to_string(),
            "You have a new notification".to_string(),
        ),
    }
}

fn payload_str<'a>(event: &'a NotificationEvent, key: &str, default: &'a str) -> &'a str {
    event
        .payload
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or(default)
}

/// Notification persistence plus best-effort live push
#[derive(Clone)]
pub struct NotificationService {
    repo: NotificationRepository,
    registry: ConnectionRegistry,
}

impl NotificationService {
    pub fn new(repo: NotificationRepository, registry: ConnectionRegistry) -> Self {
        Self { repo, registry }
    }

    /// Persist one event as a notification row and push it to the
    /// recipient's live connections
    ///
    /// The push never blocks and never fails the delivery: a recipient
    /// without a live connection simply sees the notification on their
    /// next fetch.
    pub async fn deliver(&self, event: &NotificationEvent) -> ApiResult<Notification> {
        let (kind, title, message) = render_event(event);

        let notification = self
            .repo
            .create(event.recipient_id, kind, &title, &message, &event.payload)
            .await?;

        let delivered = self.registry.send_to_user(
            event.recipient_id,
            &ServerMessage::Notification(notification.clone()),
        );
        tracing::debug!(
            recipient = %event.recipient_id,
            kind = ?kind,
            live_connections = delivered,
            "Notification created"
        );

        Ok(notification)
    }
}

/// Consume the notification queue until the process exits
///
/// Failures are logged and the message is nacked without requeue: a lost
/// notification is acceptable collateral, never a reason to crash.
pub async fn run_consumer(
    queue: QueueClient,
    service: NotificationService,
    reconnect_delay: Duration,
) {
    loop {
        let handler_service = service.clone();
        let result = queue
            .consume(
                QueueName::Notifications,
                1,
                "loopcast-api-notifications",
                move |payload| {
                    let service = handler_service.clone();
                    async move {
                        let event: NotificationEvent = serde_json::from_slice(&payload)
                            .map_err(crate::error::ApiError::from)?;
                        service.deliver(&event).await?;
                        Ok::<(), crate::error::ApiError>(())
                    }
                },
            )
            .await;

        if let Err(e) = result {
            tracing::error!(error = %e, "Notification consumer failed");
        }
        tokio::time::sleep(reconnect_delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(event_type: EventType, payload: serde_json::Value) -> NotificationEvent {
        NotificationEvent::new(event_type, Uuid::new_v4(), payload)
    }

    #[test]
    fn test_new_comment_template() {
        let e = event(
            EventType::NewComment,
            json!({ "commenterUsername": "breakfiend", "loopTitle": "Dusty Break" }),
        );
        let (kind, title, message) = render_event(&e);
        assert_eq!(kind, NotificationType::NewComment);
        assert_eq!(title, "New Comment");
        assert_eq!(message, "breakfiend commented on \"Dusty Break\"");
    }

    #[test]
    fn test_new_rating_template() {
        let e = event(
            EventType::NewRating,
            json!({ "loopTitle": "Dusty Break", "rating": 4 }),
        );
        let (kind, _, message) = render_event(&e);
        assert_eq!(kind, NotificationType::NewRating);
        assert_eq!(message, "Someone rated \"Dusty Break\" with 4 stars");
    }

    #[test]
    fn test_new_download_template() {
        let e = event(
            EventType::NewDownload,
            json!({ "downloaderUsername": "sampler", "loopTitle": "Dusty Break" }),
        );
        let (kind, title, message) = render_event(&e);
        assert_eq!(kind, NotificationType::NewDownload);
        assert_eq!(title, "Loop Downloaded");
        assert_eq!(message, "sampler downloaded \"Dusty Break\"");
    }

    #[test]
    fn test_processing_complete_template() {
        let e = event(
            EventType::ProcessingComplete,
            json!({ "loopTitle": "Dusty Break" }),
        );
        let (kind, title, message) = render_event(&e);
        assert_eq!(kind, NotificationType::ProcessingComplete);
        assert_eq!(title, "Loop Ready");
        assert_eq!(
            message,
            "Your loop \"Dusty Break\" has been processed and is now available"
        );
    }

    #[test]
    fn test_unknown_event_falls_back_to_generic() {
        let e = event(EventType::Unknown, json!({}));
        let (kind, title, message) = render_event(&e);
        assert_eq!(kind, NotificationType::System);
        assert_eq!(title, "Notification");
        assert_eq!(message, "You have a new notification");
    }

    #[test]
    fn test_missing_payload_fields_use_defaults() {
        let e = event(EventType::NewComment, json!({}));
        let (_, _, message) = render_event(&e);
        assert_eq!(message, "Someone commented on \"your loop\"");
    }

    #[test]
    fn test_no_self_notification_rule() {
        let user = Uuid::new_v4();
        assert!(!should_notify(user, user));
        assert!(should_notify(user, Uuid::new_v4()));
    }
}

//! Notification repository for centralized database operations

use sqlx::PgPool;
use uuid::Uuid;

use super::utils::NOTIFICATION_COLUMNS;
use crate::models::{Notification, NotificationType};

/// Repository for notification database operations
#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist a notification; creation is the terminal effect of a
    /// notification event
    pub async fn create(
        &self,
        user_id: Uuid,
        kind: NotificationType,
        title: &str,
        message: &str,
        payload: &serde_json::Value,
    ) -> Result<Notification, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO notifications (user_id, type, title, message, payload)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            NOTIFICATION_COLUMNS
        );
        sqlx::query_as::<_, Notification>(&sql)
            .bind(user_id)
            .bind(kind)
            .bind(title)
            .bind(message)
            .bind(payload)
            .fetch_one(&self.pool)
            .await
    }

    /// List a user's notifications, newest first
    pub async fn list(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
        unread_only: bool,
    ) -> Result<(Vec<Notification>, i64, i64), sqlx::Error> {
        let sql = format!(
            r#"
            SELECT {} FROM notifications
            WHERE user_id = $1 AND (NOT $2 OR is_read = FALSE)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
            NOTIFICATION_COLUMNS
        );
        let notifications = sqlx::query_as::<_, Notification>(&sql)
            .bind(user_id)
            .bind(unread_only)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND (NOT $2 OR is_read = FALSE)",
        )
        .bind(user_id)
        .bind(unread_only)
        .fetch_one(&self.pool)
        .await?;

        let unread: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((notifications, total, unread))
    }

    /// Mark one notification as read; scoped to the owning user
    pub async fn mark_read(&self, user_id: Uuid, notification_id: Uuid) -> Result<bool, sqlx::Error> {
        let updated = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE id = $1 AND user_id = $2",
        )
        .bind(notification_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(updated > 0)
    }

    /// Mark all of a user's notifications as read
    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let updated = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(updated)
    }

    /// Delete a notification; scoped to the owning user
    pub async fn delete(&self, user_id: Uuid, notification_id: Uuid) -> Result<bool, sqlx::Error> {
        let deleted = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
            .bind(notification_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(deleted > 0)
    }
}

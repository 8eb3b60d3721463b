//! Loop status and artifact writes
//!
//! Blind writes keyed by loop id: the pipeline never needs to read a row
//! before updating it, which keeps the status transitions race-free under
//! at-least-once redelivery.

use sqlx::PgPool;
use uuid::Uuid;

/// Owner data returned by the final processing write, used to address the
/// processing-complete notification.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProcessedLoop {
    pub user_id: Uuid,
    pub title: String,
}

/// Store for loop lifecycle writes from the worker
#[derive(Clone)]
pub struct LoopStore {
    pool: PgPool,
}

impl LoopStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Flip a loop to PROCESSING before any media work begins, so clients
    /// polling the status see activity immediately
    pub async fn mark_processing(&self, loop_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE loops
            SET status = 'processing', updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(loop_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Terminal failure write; no partial artifacts are recorded
    pub async fn mark_failed(&self, loop_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE loops
            SET status = 'failed', updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(loop_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Terminal success write: preview path, waveform envelope, READY
    /// status, and the probe-corrected duration land in one statement.
    ///
    /// The duration is only overwritten when the probe produced a valid
    /// positive value; otherwise the upload-time value stands.
    ///
    /// Returns the owner and title for the processing-complete
    /// notification, or `None` if the loop row no longer exists.
    pub async fn finish_processing(
        &self,
        loop_id: Uuid,
        preview_file: &str,
        waveform: &[f32],
        duration_secs: Option<f64>,
    ) -> Result<Option<ProcessedLoop>, sqlx::Error> {
        sqlx::query_as(
            r#"
            UPDATE loops
            SET preview_file = $2,
                waveform = $3,
                duration_secs = COALESCE($4, duration_secs),
                status = 'ready',
                updated_at = NOW()
            WHERE id = $1
            RETURNING user_id, title
            "#,
        )
        .bind(loop_id)
        .bind(preview_file)
        .bind(serde_json::json!(waveform))
        .bind(duration_secs)
        .fetch_optional(&self.pool)
        .await
    }
}

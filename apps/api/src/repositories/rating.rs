//! Rating repository for centralized database operations

use sqlx::PgPool;
use uuid::Uuid;

/// Repository for rating database operations
#[derive(Clone)]
pub struct RatingRepository {
    pool: PgPool,
}

impl RatingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert or update a user's rating of a loop
    pub async fn upsert(
        &self,
        loop_id: Uuid,
        user_id: Uuid,
        value: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO ratings (loop_id, user_id, value)
            VALUES ($1, $2, $3)
            ON CONFLICT (loop_id, user_id)
            DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
            "#,
        )
        .bind(loop_id)
        .bind(user_id)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// A user's rating of a loop, if any
    pub async fn find(&self, loop_id: Uuid, user_id: Uuid) -> Result<Option<i32>, sqlx::Error> {
        sqlx::query_scalar("SELECT value FROM ratings WHERE loop_id = $1 AND user_id = $2")
            .bind(loop_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Remove a user's rating; returns whether a row was deleted
    pub async fn delete(&self, loop_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let deleted = sqlx::query("DELETE FROM ratings WHERE loop_id = $1 AND user_id = $2")
            .bind(loop_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(deleted > 0)
    }
}

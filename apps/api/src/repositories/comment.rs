//! Comment repository for centralized database operations

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Comment, CommentWithAuthor};

/// Repository for comment database operations
#[derive(Clone)]
pub struct CommentRepository {
    pool: PgPool,
}

impl CommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a comment and return it joined with the author profile
    pub async fn create(
        &self,
        loop_id: Uuid,
        user_id: Uuid,
        content: &str,
    ) -> Result<CommentWithAuthor, sqlx::Error> {
        sqlx::query_as::<_, CommentWithAuthor>(
            r#"
            WITH inserted AS (
                INSERT INTO comments (loop_id, user_id, content)
                VALUES ($1, $2, $3)
                RETURNING id, loop_id, user_id, content, created_at
            )
            SELECT i.id, i.loop_id, i.user_id, i.content, i.created_at,
                   u.username AS author_username,
                   u.avatar_url AS author_avatar_url
            FROM inserted i
            JOIN users u ON u.id = i.user_id
            "#,
        )
        .bind(loop_id)
        .bind(user_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await
    }

    /// Find a comment by ID
    pub async fn find_by_id(&self, comment_id: Uuid) -> Result<Option<Comment>, sqlx::Error> {
        sqlx::query_as::<_, Comment>(
            "SELECT id, loop_id, user_id, content, created_at FROM comments WHERE id = $1",
        )
        .bind(comment_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// List comments on a loop, newest first
    pub async fn list_by_loop(
        &self,
        loop_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<CommentWithAuthor>, i64), sqlx::Error> {
        let comments = sqlx::query_as::<_, CommentWithAuthor>(
            r#"
            SELECT c.id, c.loop_id, c.user_id, c.content, c.created_at,
                   u.username AS author_username,
                   u.avatar_url AS author_avatar_url
            FROM comments c
            JOIN users u ON u.id = c.user_id
            WHERE c.loop_id = $1
            ORDER BY c.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(loop_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE loop_id = $1")
            .bind(loop_id)
            .fetch_one(&self.pool)
            .await?;

        Ok((comments, total))
    }

    /// Delete a comment
    pub async fn delete(&self, comment_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(comment_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

//! Download repository for centralized database operations

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Download record joined with loop details, for history listings and
/// certificate verification
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRecord {
    pub id: Uuid,
    pub loop_id: Uuid,
    pub loop_title: String,
    pub loop_slug: String,
    pub file_hash: String,
    pub certificate_hash: String,
    pub username: String,
    pub downloaded_at: DateTime<Utc>,
}

/// Repository for download database operations
#[derive(Clone)]
pub struct DownloadRepository {
    pool: PgPool,
}

impl DownloadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record a certified download
    pub async fn create(
        &self,
        loop_id: Uuid,
        user_id: Uuid,
        certificate_hash: &str,
        ip_address: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO downloads (loop_id, user_id, certificate_hash, ip_address)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(loop_id)
        .bind(user_id)
        .bind(certificate_hash)
        .bind(ip_address)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Whether the user has downloaded this loop before
    pub async fn has_downloaded(&self, loop_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM downloads WHERE loop_id = $1 AND user_id = $2)",
        )
        .bind(loop_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
    }

    /// A user's download history, newest first
    pub async fn list_by_user(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<DownloadRecord>, i64), sqlx::Error> {
        let downloads = sqlx::query_as::<_, DownloadRecord>(
            r#"
            SELECT d.id, d.loop_id, l.title AS loop_title, l.slug AS loop_slug,
                   l.file_hash, d.certificate_hash,
                   u.username, d.created_at AS downloaded_at
            FROM downloads d
            JOIN loops l ON l.id = d.loop_id
            JOIN users u ON u.id = d.user_id
            WHERE d.user_id = $1
            ORDER BY d.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM downloads WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok((downloads, total))
    }

    /// Look up a download by its certificate hash
    pub async fn find_by_certificate(
        &self,
        certificate_hash: &str,
    ) -> Result<Option<DownloadRecord>, sqlx::Error> {
        sqlx::query_as::<_, DownloadRecord>(
            r#"
            SELECT d.id, d.loop_id, l.title AS loop_title, l.slug AS loop_slug,
                   l.file_hash, d.certificate_hash,
                   u.username, d.created_at AS downloaded_at
            FROM downloads d
            JOIN loops l ON l.id = d.loop_id
            JOIN users u ON u.id = d.user_id
            WHERE d.certificate_hash = $1
            "#,
        )
        .bind(certificate_hash)
        .fetch_optional(&self.pool)
        .await
    }
}

//! Loop repository for centralized database operations

use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::utils::{escape_ilike, LOOP_COLUMNS, LOOP_COLUMNS_L};
use crate::models::r#loop::{Loop, LoopStatus, LoopWithUploader};

/// Fields required to insert a loop row
#[derive(Debug, Clone)]
pub struct NewLoop {
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub bpm: i32,
    pub musical_key: Option<String>,
    pub duration_secs: f64,
    pub genre: Option<String>,
    pub original_file: String,
    pub file_hash: String,
    pub user_id: Uuid,
}

/// Minimal loop reference used by notification producers
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LoopRef {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
}

/// Sortable listing columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    CreatedAt,
    DownloadCount,
    ListenCount,
    AverageRating,
    Bpm,
}

impl SortField {
    fn as_column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::DownloadCount => "download_count",
            Self::ListenCount => "listen_count",
            Self::AverageRating => "average_rating",
            Self::Bpm => "bpm",
        }
    }
}

impl std::str::FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "createdAt" | "created_at" => Ok(Self::CreatedAt),
            "downloadCount" | "download_count" => Ok(Self::DownloadCount),
            "listenCount" | "listen_count" => Ok(Self::ListenCount),
            "averageRating" | "average_rating" => Ok(Self::AverageRating),
            "bpm" => Ok(Self::Bpm),
            other => Err(format!("unknown sort field: {}", other)),
        }
    }
}

/// Listing sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Listing filters; `None` fields are not applied
#[derive(Debug, Clone, Default)]
pub struct LoopFilter {
    pub search: Option<String>,
    pub bpm_min: Option<i32>,
    pub bpm_max: Option<i32>,
    pub musical_key: Option<String>,
    pub genre: Option<String>,
    pub tags: Vec<String>,
    pub user_id: Option<Uuid>,
    pub status: Option<LoopStatus>,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
    pub page: i64,
    pub limit: i64,
}

/// Repository for loop database operations
#[derive(Clone)]
pub struct LoopRepository {
    pool: PgPool,
}

impl LoopRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new loop in PENDING state
    pub async fn create(&self, new_loop: &NewLoop) -> Result<Loop, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO loops
                (slug, title, description, bpm, musical_key, duration_secs,
                 genre, original_file, file_hash, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            LOOP_COLUMNS
        );
        sqlx::query_as::<_, Loop>(&sql)
            .bind(&new_loop.slug)
            .bind(&new_loop.title)
            .bind(&new_loop.description)
            .bind(new_loop.bpm)
            .bind(&new_loop.musical_key)
            .bind(new_loop.duration_secs)
            .bind(&new_loop.genre)
            .bind(&new_loop.original_file)
            .bind(&new_loop.file_hash)
            .bind(new_loop.user_id)
            .fetch_one(&self.pool)
            .await
    }

    /// Find a loop by its unique ID
    pub async fn find_by_id(&self, loop_id: Uuid) -> Result<Option<Loop>, sqlx::Error> {
        let sql = format!("SELECT {} FROM loops WHERE id = $1", LOOP_COLUMNS);
        sqlx::query_as::<_, Loop>(&sql)
            .bind(loop_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Find a loop by slug, falling back to ID when the argument parses
    /// as a UUID (slugs are the canonical public handle)
    pub async fn resolve(&self, id_or_slug: &str) -> Result<Option<Loop>, sqlx::Error> {
        let sql = format!("SELECT {} FROM loops WHERE slug = $1", LOOP_COLUMNS);
        let by_slug = sqlx::query_as::<_, Loop>(&sql)
            .bind(id_or_slug)
            .fetch_optional(&self.pool)
            .await?;

        if by_slug.is_some() {
            return Ok(by_slug);
        }
        match Uuid::parse_str(id_or_slug) {
            Ok(id) => self.find_by_id(id).await,
            Err(_) => Ok(None),
        }
    }

    /// Resolve only the fields notification producers need
    pub async fn resolve_ref(&self, id_or_slug: &str) -> Result<Option<LoopRef>, sqlx::Error> {
        let by_slug = sqlx::query_as::<_, LoopRef>(
            "SELECT id, user_id, title FROM loops WHERE slug = $1",
        )
        .bind(id_or_slug)
        .fetch_optional(&self.pool)
        .await?;

        if by_slug.is_some() {
            return Ok(by_slug);
        }
        match Uuid::parse_str(id_or_slug) {
            Ok(id) => {
                sqlx::query_as::<_, LoopRef>(
                    "SELECT id, user_id, title FROM loops WHERE id = $1",
                )
                .bind(id)
                .fetch_optional(&self.pool)
                .await
            }
            Err(_) => Ok(None),
        }
    }

    /// Find a loop with its uploader's public profile
    pub async fn resolve_with_uploader(
        &self,
        id_or_slug: &str,
    ) -> Result<Option<LoopWithUploader>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT {},
                   u.username AS uploader_username,
                   u.avatar_url AS uploader_avatar_url
            FROM loops l
            JOIN users u ON u.id = l.user_id
            WHERE l.slug = $1 OR l.id = $2
            LIMIT 1
            "#,
            LOOP_COLUMNS_L
        );
        let as_uuid = Uuid::parse_str(id_or_slug).unwrap_or(Uuid::nil());
        sqlx::query_as::<_, LoopWithUploader>(&sql)
            .bind(id_or_slug)
            .bind(as_uuid)
            .fetch_optional(&self.pool)
            .await
    }

    /// Whether a slug is already taken
    pub async fn slug_exists(&self, slug: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM loops WHERE slug = $1)")
            .bind(slug)
            .fetch_one(&self.pool)
            .await
    }

    /// List loops matching the filter, with pagination
    pub async fn list(
        &self,
        filter: &LoopFilter,
    ) -> Result<(Vec<LoopWithUploader>, i64), sqlx::Error> {
        let mut query = QueryBuilder::<Postgres>::new(format!(
            r#"
            SELECT {},
                   u.username AS uploader_username,
                   u.avatar_url AS uploader_avatar_url
            FROM loops l
            JOIN users u ON u.id = l.user_id
            "#,
            LOOP_COLUMNS_L
        ));
        Self::apply_filters(&mut query, filter);
        query.push(format!(
            " ORDER BY l.{} {}, l.created_at DESC",
            filter.sort_by.as_column(),
            filter.sort_order.as_sql()
        ));

        let limit = filter.limit.max(1);
        let offset = (filter.page.max(1) - 1) * limit;
        query.push(" LIMIT ");
        query.push_bind(limit);
        query.push(" OFFSET ");
        query.push_bind(offset);

        let loops = query
            .build_query_as::<LoopWithUploader>()
            .fetch_all(&self.pool)
            .await?;

        let mut count_query =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM loops l");
        Self::apply_filters(&mut count_query, filter);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        Ok((loops, total))
    }

    fn apply_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &LoopFilter) {
        query.push(" WHERE 1=1");

        if let Some(search) = &filter.search {
            // A small number is a BPM search, anything else a text search
            match search.trim().parse::<i32>() {
                Ok(bpm) if (1..=300).contains(&bpm) => {
                    query.push(" AND l.bpm = ").push_bind(bpm);
                }
                _ => {
                    let pattern = format!("%{}%", escape_ilike(search));
                    query
                        .push(" AND (l.title ILIKE ")
                        .push_bind(pattern.clone())
                        .push(" OR l.description ILIKE ")
                        .push_bind(pattern)
                        .push(")");
                }
            }
        }

        if let Some(bpm_min) = filter.bpm_min {
            query.push(" AND l.bpm >= ").push_bind(bpm_min);
        }
        if let Some(bpm_max) = filter.bpm_max {
            query.push(" AND l.bpm <= ").push_bind(bpm_max);
        }
        if let Some(key) = &filter.musical_key {
            query.push(" AND l.musical_key = ").push_bind(key.clone());
        }
        if let Some(genre) = &filter.genre {
            query
                .push(" AND l.genre ILIKE ")
                .push_bind(format!("%{}%", escape_ilike(genre)));
        }
        if let Some(user_id) = filter.user_id {
            query.push(" AND l.user_id = ").push_bind(user_id);
        }
        if let Some(status) = filter.status {
            query.push(" AND l.status = ").push_bind(status);
        }
        if !filter.tags.is_empty() {
            let tags: Vec<String> = filter.tags.iter().map(|t| t.to_lowercase()).collect();
            query
                .push(
                    " AND EXISTS (SELECT 1 FROM loop_tags lt \
                     JOIN tags t ON t.id = lt.tag_id \
                     WHERE lt.loop_id = l.id AND t.name = ANY(",
                )
                .push_bind(tags)
                .push("))");
        }
    }

    /// Upsert tags by name and associate them with a loop
    pub async fn attach_tags(&self, loop_id: Uuid, tags: &[String]) -> Result<(), sqlx::Error> {
        for name in tags {
            let name = name.trim().to_lowercase();
            if name.is_empty() {
                continue;
            }
            let tag_id: Uuid = sqlx::query_scalar(
                r#"
                INSERT INTO tags (name) VALUES ($1)
                ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
                RETURNING id
                "#,
            )
            .bind(&name)
            .fetch_one(&self.pool)
            .await?;

            sqlx::query(
                "INSERT INTO loop_tags (loop_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(loop_id)
            .bind(tag_id)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    /// Tag names associated with a loop
    pub async fn tags_for(&self, loop_id: Uuid) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT t.name FROM tags t
            JOIN loop_tags lt ON lt.tag_id = t.id
            WHERE lt.loop_id = $1
            ORDER BY t.name
            "#,
        )
        .bind(loop_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Record a listen, counted once per user per day
    ///
    /// Returns whether the listen was counted.
    pub async fn record_listen(&self, loop_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO listens (loop_id, user_id, listen_date)
            VALUES ($1, $2, CURRENT_DATE)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(loop_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if inserted == 0 {
            return Ok(false);
        }

        sqlx::query("UPDATE loops SET listen_count = listen_count + 1 WHERE id = $1")
            .bind(loop_id)
            .execute(&self.pool)
            .await?;
        Ok(true)
    }

    /// Increment the download counter
    pub async fn increment_download_count(&self, loop_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE loops SET download_count = download_count + 1 WHERE id = $1")
            .bind(loop_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Recompute the rating aggregates from the ratings table
    pub async fn refresh_rating_stats(&self, loop_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE loops
            SET average_rating = COALESCE(
                    (SELECT AVG(value)::double precision FROM ratings WHERE loop_id = $1), 0),
                rating_count = (SELECT COUNT(*) FROM ratings WHERE loop_id = $1)
            WHERE id = $1
            "#,
        )
        .bind(loop_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

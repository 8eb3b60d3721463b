//! Comment model

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Comment record from the comments table
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub loop_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Comment joined with its author's public profile
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentWithAuthor {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub record: Comment,

    pub author_username: String,
    pub author_avatar_url: Option<String>,
}

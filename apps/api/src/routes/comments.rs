//! Comment REST route handlers
//!
//! - `POST /loops/{id_or_slug}/comments` - Comment on a loop
//! - `GET /loops/{id_or_slug}/comments` - List comments
//! - `DELETE /comments/{id}` - Delete own comment
//!
//! Creating a comment publishes a new-comment event for the loop owner,
//! except when commenting on one's own loop.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use loopcast_queue::{EventType, NotificationEvent, QueueClient, QueueName};

use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthUser;
use crate::models::{CommentWithAuthor, Page, PageMeta};
use crate::repositories::{CommentRepository, LoopRepository};
use crate::services::notifications::should_notify;

const MAX_COMMENT_LEN: usize = 2000;

/// Shared application state for comment handlers
#[derive(Clone)]
pub struct CommentsState {
    pub comments: Arc<CommentRepository>,
    pub loops: Arc<LoopRepository>,
    pub queue: QueueClient,
}

impl CommentsState {
    pub fn new(comments: CommentRepository, loops: Arc<LoopRepository>, queue: QueueClient) -> Self {
        Self {
            comments: Arc::new(comments),
            loops,
            queue,
        }
    }
}

/// Create the comments router
pub fn comments_router(state: CommentsState) -> Router {
    Router::new()
        .route(
            "/loops/{id_or_slug}/comments",
            get(list_comments).post(create_comment),
        )
        .route("/comments/{comment_id}", delete(delete_comment))
        .with_state(state)
}

/// Comment creation body
#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
}

/// Pagination query
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

async fn create_comment(
    State(state): State<CommentsState>,
    auth: AuthUser,
    Path(id_or_slug): Path<String>,
    Json(body): Json<CreateCommentRequest>,
) -> ApiResult<(StatusCode, Json<CommentWithAuthor>)> {
    let content = body.content.trim();
    if content.is_empty() {
        return Err(ApiError::ValidationError("comment cannot be empty".to_string()));
    }
    if content.len() > MAX_COMMENT_LEN {
        return Err(ApiError::ValidationError(format!(
            "comment cannot exceed {} characters",
            MAX_COMMENT_LEN
        )));
    }

    let loop_ref = state
        .loops
        .resolve_ref(&id_or_slug)
        .await?
        .ok_or_else(|| ApiError::not_found("loop", &id_or_slug))?;

    let comment = state
        .comments
        .create(loop_ref.id, auth.user_id, content)
        .await?;

    if should_notify(auth.user_id, loop_ref.user_id) {
        let event = NotificationEvent::new(
            EventType::NewComment,
            loop_ref.user_id,
            json!({
                "loopId": loop_ref.id,
                "loopTitle": loop_ref.title,
                "commentId": comment.record.id,
                "commenterUsername": auth.username,
            }),
        );
        state.queue.publish(QueueName::Notifications, &event).await?;
    }

    Ok((StatusCode::CREATED, Json(comment)))
}

async fn list_comments(
    State(state): State<CommentsState>,
    Path(id_or_slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page<CommentWithAuthor>>> {
    let loop_ref = state
        .loops
        .resolve_ref(&id_or_slug)
        .await?
        .ok_or_else(|| ApiError::not_found("loop", &id_or_slug))?;

    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let (comments, total) = state
        .comments
        .list_by_loop(loop_ref.id, limit, (page - 1) * limit)
        .await?;

    Ok(Json(Page {
        meta: PageMeta::new(total, page, limit),
        data: comments,
    }))
}

async fn delete_comment(
    State(state): State<CommentsState>,
    auth: AuthUser,
    Path(comment_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let comment = state
        .comments
        .find_by_id(comment_id)
        .await?
        .ok_or_else(|| ApiError::not_found("comment", comment_id.to_string()))?;

    if comment.user_id != auth.user_id {
        return Err(ApiError::Forbidden(
            "you can only delete your own comments".to_string(),
        ));
    }

    state.comments.delete(comment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

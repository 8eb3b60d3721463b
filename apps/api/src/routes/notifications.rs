//! Notification REST route handlers
//!
//! - `GET /notifications` - Own notifications (paginated, unread filter)
//! - `POST /notifications/{id}/read` - Mark one as read
//! - `POST /notifications/read-all` - Mark all as read
//! - `DELETE /notifications/{id}` - Delete one

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthUser;
use crate::models::{Notification, PageMeta};
use crate::repositories::NotificationRepository;

/// Shared application state for notification handlers
#[derive(Clone)]
pub struct NotificationsState {
    pub notifications: Arc<NotificationRepository>,
}

impl NotificationsState {
    pub fn new(notifications: NotificationRepository) -> Self {
        Self {
            notifications: Arc::new(notifications),
        }
    }
}

/// Create the notifications router
pub fn notifications_router(state: NotificationsState) -> Router {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/{id}/read", post(mark_read))
        .route("/notifications/read-all", post(mark_all_read))
        .route("/notifications/{id}", delete(delete_notification))
        .with_state(state)
}

/// Listing query parameters
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNotificationsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    #[serde(default)]
    pub unread_only: bool,
}

/// Notification listing with unread counter
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPage {
    pub data: Vec<Notification>,
    pub meta: PageMeta,
    pub unread_count: i64,
}

async fn list_notifications(
    State(state): State<NotificationsState>,
    auth: AuthUser,
    Query(query): Query<ListNotificationsQuery>,
) -> ApiResult<Json<NotificationPage>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let (notifications, total, unread_count) = state
        .notifications
        .list(auth.user_id, limit, (page - 1) * limit, query.unread_only)
        .await?;

    Ok(Json(NotificationPage {
        data: notifications,
        meta: PageMeta::new(total, page, limit),
        unread_count,
    }))
}

async fn mark_read(
    State(state): State<NotificationsState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let updated = state.notifications.mark_read(auth.user_id, id).await?;
    if !updated {
        return Err(ApiError::not_found("notification", id.to_string()));
    }
    Ok(Json(json!({ "read": true })))
}

async fn mark_all_read(
    State(state): State<NotificationsState>,
    auth: AuthUser,
) -> ApiResult<Json<serde_json::Value>> {
    let updated = state.notifications.mark_all_read(auth.user_id).await?;
    Ok(Json(json!({ "updated": updated })))
}

async fn delete_notification(
    State(state): State<NotificationsState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let deleted = state.notifications.delete(auth.user_id, id).await?;
    if !deleted {
        return Err(ApiError::not_found("notification", id.to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

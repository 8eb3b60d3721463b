//! Rating REST route handlers
//!
//! - `PUT /loops/{id_or_slug}/rating` - Rate a loop 1-5 (upsert)
//! - `DELETE /loops/{id_or_slug}/rating` - Remove own rating
//!
//! Rating a loop refreshes the aggregate stats and publishes a new-rating
//! event for the owner, except when rating one's own loop.

use axum::{
    extract::{Path, State},
    routing::put,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use loopcast_queue::{EventType, NotificationEvent, QueueClient, QueueName};

use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthUser;
use crate::repositories::{LoopRepository, RatingRepository};
use crate::services::notifications::should_notify;

/// Shared application state for rating handlers
#[derive(Clone)]
pub struct RatingsState {
    pub ratings: Arc<RatingRepository>,
    pub loops: Arc<LoopRepository>,
    pub queue: QueueClient,
}

impl RatingsState {
    pub fn new(ratings: RatingRepository, loops: Arc<LoopRepository>, queue: QueueClient) -> Self {
        Self {
            ratings: Arc::new(ratings),
            loops,
            queue,
        }
    }
}

/// Create the ratings router
pub fn ratings_router(state: RatingsState) -> Router {
    Router::new()
        .route(
            "/loops/{id_or_slug}/rating",
            put(rate_loop).delete(remove_rating),
        )
        .with_state(state)
}

/// Rating body
#[derive(Debug, Deserialize)]
pub struct RateRequest {
    pub value: i32,
}

/// Rating response
#[derive(Debug, Serialize)]
pub struct RateResponse {
    pub value: i32,
}

async fn rate_loop(
    State(state): State<RatingsState>,
    auth: AuthUser,
    Path(id_or_slug): Path<String>,
    Json(body): Json<RateRequest>,
) -> ApiResult<Json<RateResponse>> {
    if !(1..=5).contains(&body.value) {
        return Err(ApiError::ValidationError(
            "rating must be between 1 and 5".to_string(),
        ));
    }

    let loop_ref = state
        .loops
        .resolve_ref(&id_or_slug)
        .await?
        .ok_or_else(|| ApiError::not_found("loop", &id_or_slug))?;

    state
        .ratings
        .upsert(loop_ref.id, auth.user_id, body.value)
        .await?;
    state.loops.refresh_rating_stats(loop_ref.id).await?;

    if should_notify(auth.user_id, loop_ref.user_id) {
        let event = NotificationEvent::new(
            EventType::NewRating,
            loop_ref.user_id,
            json!({
                "loopId": loop_ref.id,
                "loopTitle": loop_ref.title,
                "rating": body.value,
            }),
        );
        state.queue.publish(QueueName::Notifications, &event).await?;
    }

    Ok(Json(RateResponse { value: body.value }))
}

async fn remove_rating(
    State(state): State<RatingsState>,
    auth: AuthUser,
    Path(id_or_slug): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let loop_ref = state
        .loops
        .resolve_ref(&id_or_slug)
        .await?
        .ok_or_else(|| ApiError::not_found("loop", &id_or_slug))?;

    let deleted = state.ratings.delete(loop_ref.id, auth.user_id).await?;
    if !deleted {
        return Err(ApiError::not_found("rating", &id_or_slug));
    }
    state.loops.refresh_rating_stats(loop_ref.id).await?;

    Ok(Json(json!({ "message": "Rating removed" })))
}

//! Loop REST route handlers
//!
//! - `POST /loops` - Upload a loop (multipart) and enqueue processing
//! - `GET /loops` - Browse loops with filters and pagination
//! - `GET /loops/{id_or_slug}` - Loop detail with uploader and tags
//! - `POST /loops/{id_or_slug}/listens` - Record a listen (once per day)
//!
//! The upload handler is the producer side of the media pipeline: it
//! persists the original file and a PENDING row, then enqueues the
//! processing job. Everything else about the loop's artifacts is written
//! by the worker.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use loopcast_queue::{ProcessingJob, QueueClient, QueueName};
use loopcast_shared_config::StorageConfig;

use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthUser;
use crate::models::r#loop::{
    Loop, LoopStatus, LoopWithUploader, BPM_MAX, BPM_MIN, DEFAULT_DURATION_SECS,
    DURATION_MAX_SECS, DURATION_MIN_SECS,
};
use crate::models::{Page, PageMeta};
use crate::repositories::{LoopFilter, LoopRepository, NewLoop, SortField, SortOrder};
use crate::services::slug::unique_slug;
use crate::services::storage::{file_extension, is_supported_extension, store_original};

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

/// Shared application state for loop handlers
#[derive(Clone)]
pub struct LoopsState {
    pub loops: Arc<LoopRepository>,
    pub queue: QueueClient,
    pub storage: StorageConfig,
}

impl LoopsState {
    pub fn new(loops: Arc<LoopRepository>, queue: QueueClient, storage: StorageConfig) -> Self {
        Self {
            loops,
            queue,
            storage,
        }
    }
}

/// Create the loops router
pub fn loops_router(state: LoopsState) -> Router {
    Router::new()
        .route("/loops", post(upload_loop).get(list_loops))
        .route("/loops/{id_or_slug}", get(get_loop))
        .route("/loops/{id_or_slug}/listens", post(record_listen))
        .with_state(state)
}

// ========== Request/Response Types ==========

/// Query parameters for the loop listing
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListLoopsQuery {
    pub search: Option<String>,
    pub bpm_min: Option<i32>,
    pub bpm_max: Option<i32>,
    pub key: Option<String>,
    pub genre: Option<String>,
    /// Comma-separated tag names
    pub tags: Option<String>,
    pub user_id: Option<Uuid>,
    pub status: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Loop detail response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopDetail {
    #[serde(flatten)]
    pub record: LoopWithUploader,
    pub tags: Vec<String>,
}

/// Listen response
#[derive(Debug, Serialize)]
pub struct ListenResponse {
    pub counted: bool,
}

// ========== Handlers ==========

/// Collected multipart upload fields
#[derive(Default)]
struct UploadForm {
    title: Option<String>,
    description: Option<String>,
    bpm: Option<i32>,
    musical_key: Option<String>,
    duration: Option<f64>,
    genre: Option<String>,
    tags: Vec<String>,
    file_name: Option<String>,
    file_bytes: Option<axum::body::Bytes>,
}

async fn read_upload_form(mut multipart: Multipart) -> ApiResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidBody(e.to_string()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match name.as_str() {
            "title" => form.title = Some(read_text(field).await?),
            "description" => form.description = Some(read_text(field).await?),
            "bpm" => {
                form.bpm = Some(read_text(field).await?.trim().parse().map_err(|_| {
                    ApiError::ValidationError("bpm must be an integer".to_string())
                })?)
            }
            "key" => form.musical_key = Some(read_text(field).await?),
            "duration" => {
                form.duration = Some(read_text(field).await?.trim().parse().map_err(|_| {
                    ApiError::ValidationError("duration must be a number".to_string())
                })?)
            }
            "genre" => form.genre = Some(read_text(field).await?),
            "tags" => {
                let raw = read_text(field).await?;
                form.tags.extend(
                    raw.split(',')
                        .map(|t| t.trim().to_string())
                        .filter(|t| !t.is_empty()),
                );
            }
            "file" => {
                form.file_name = field.file_name().map(str::to_string);
                form.file_bytes = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::InvalidBody(e.to_string()))?,
                );
            }
            _ => {}
        }
    }

    Ok(form)
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> ApiResult<String> {
    field
        .text()
        .await
        .map_err(|e| ApiError::InvalidBody(e.to_string()))
}

async fn upload_loop(
    State(state): State<LoopsState>,
    auth: AuthUser,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<Loop>)> {
    let form = read_upload_form(multipart).await?;

    let title = form
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(ApiError::MissingField("title"))?
        .to_string();

    let bpm = form.bpm.ok_or(ApiError::MissingField("bpm"))?;
    if !(BPM_MIN..=BPM_MAX).contains(&bpm) {
        return Err(ApiError::ValidationError(format!(
            "bpm must be between {} and {}",
            BPM_MIN, BPM_MAX
        )));
    }

    let bytes = form.file_bytes.ok_or(ApiError::MissingField("file"))?;
    if bytes.is_empty() {
        return Err(ApiError::ValidationError("uploaded file is empty".to_string()));
    }

    let file_name = form.file_name.unwrap_or_default();
    let extension = file_extension(&file_name)
        .ok_or_else(|| ApiError::UnsupportedFormat("file has no extension".to_string()))?;
    if !is_supported_extension(&extension) {
        return Err(ApiError::UnsupportedFormat(extension));
    }

    // Upload-time duration is provisional; the worker replaces it with
    // the probed value once processing completes
    let duration_secs = form.duration.unwrap_or(DEFAULT_DURATION_SECS);
    if !(DURATION_MIN_SECS..=DURATION_MAX_SECS).contains(&duration_secs) {
        return Err(ApiError::ValidationError(format!(
            "loop duration must be between {} and {} seconds",
            DURATION_MIN_SECS, DURATION_MAX_SECS
        )));
    }

    let stored = store_original(&state.storage, &extension, &bytes).await?;
    let slug = unique_slug(&state.loops, &title).await?;

    let loop_row = state
        .loops
        .create(&NewLoop {
            slug,
            title,
            description: form.description,
            bpm,
            musical_key: form.musical_key,
            duration_secs,
            genre: form.genre,
            original_file: stored.relative_path.clone(),
            file_hash: stored.file_hash,
            user_id: auth.user_id,
        })
        .await?;

    if !form.tags.is_empty() {
        state.loops.attach_tags(loop_row.id, &form.tags).await?;
    }

    // Hand the file to the worker; the HTTP request completes while the
    // loop is still PENDING
    state
        .queue
        .publish(
            QueueName::AudioProcessing,
            &ProcessingJob::transcode(loop_row.id, &stored.relative_path),
        )
        .await?;

    tracing::info!(
        loop_id = %loop_row.id,
        slug = %loop_row.slug,
        user_id = %auth.user_id,
        "Loop uploaded, processing queued"
    );

    Ok((StatusCode::CREATED, Json(loop_row)))
}

async fn list_loops(
    State(state): State<LoopsState>,
    Query(query): Query<ListLoopsQuery>,
) -> ApiResult<Json<Page<LoopWithUploader>>> {
    let filter = build_filter(query)?;
    let (loops, total) = state.loops.list(&filter).await?;

    Ok(Json(Page {
        meta: PageMeta::new(total, filter.page, filter.limit),
        data: loops,
    }))
}

fn build_filter(query: ListLoopsQuery) -> ApiResult<LoopFilter> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<LoopStatus>)
        .transpose()
        .map_err(ApiError::ValidationError)?;

    // Public listings only show READY loops unless the caller filters by
    // uploader or status explicitly
    let status = match (status, query.user_id) {
        (Some(status), _) => Some(status),
        (None, Some(_)) => None,
        (None, None) => Some(LoopStatus::Ready),
    };

    let sort_by = query
        .sort_by
        .as_deref()
        .map(str::parse::<SortField>)
        .transpose()
        .map_err(ApiError::ValidationError)?
        .unwrap_or_default();

    let sort_order = match query.sort_order.as_deref() {
        None => SortOrder::default(),
        Some("asc") | Some("ASC") => SortOrder::Asc,
        Some("desc") | Some("DESC") => SortOrder::Desc,
        Some(other) => {
            return Err(ApiError::ValidationError(format!(
                "unknown sort order: {}",
                other
            )))
        }
    };

    Ok(LoopFilter {
        search: query.search.filter(|s| !s.trim().is_empty()),
        bpm_min: query.bpm_min,
        bpm_max: query.bpm_max,
        musical_key: query.key,
        genre: query.genre,
        tags: query
            .tags
            .map(|raw| {
                raw.split(',')
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .unwrap_or_default(),
        user_id: query.user_id,
        status,
        sort_by,
        sort_order,
        page: query.page.unwrap_or(1).max(1),
        limit: query
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE),
    })
}

async fn get_loop(
    State(state): State<LoopsState>,
    Path(id_or_slug): Path<String>,
) -> ApiResult<Json<LoopDetail>> {
    let record = state
        .loops
        .resolve_with_uploader(&id_or_slug)
        .await?
        .ok_or_else(|| ApiError::not_found("loop", &id_or_slug))?;

    let tags = state.loops.tags_for(record.record.id).await?;

    Ok(Json(LoopDetail { record, tags }))
}

async fn record_listen(
    State(state): State<LoopsState>,
    auth: AuthUser,
    Path(id_or_slug): Path<String>,
) -> ApiResult<Json<ListenResponse>> {
    let loop_ref = state
        .loops
        .resolve_ref(&id_or_slug)
        .await?
        .ok_or_else(|| ApiError::not_found("loop", &id_or_slug))?;

    let counted = state.loops.record_listen(loop_ref.id, auth.user_id).await?;
    Ok(Json(ListenResponse { counted }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_listing_defaults_to_ready() {
        let filter = build_filter(ListLoopsQuery::default()).unwrap();
        assert_eq!(filter.status, Some(LoopStatus::Ready));
    }

    #[test]
    fn test_owner_listing_sees_all_statuses() {
        let query = ListLoopsQuery {
            user_id: Some(Uuid::new_v4()),
            ..Default::default()
        };
        let filter = build_filter(query).unwrap();
        assert_eq!(filter.status, None);
    }

    #[test]
    fn test_explicit_status_filter_wins() {
        let query = ListLoopsQuery {
            status: Some("failed".to_string()),
            user_id: Some(Uuid::new_v4()),
            ..Default::default()
        };
        let filter = build_filter(query).unwrap();
        assert_eq!(filter.status, Some(LoopStatus::Failed));
    }

    #[test]
    fn test_limit_is_clamped() {
        let query = ListLoopsQuery {
            limit: Some(10_000),
            ..Default::default()
        };
        assert_eq!(build_filter(query).unwrap().limit, MAX_PAGE_SIZE);

        let query = ListLoopsQuery {
            limit: Some(0),
            ..Default::default()
        };
        assert_eq!(build_filter(query).unwrap().limit, 1);
    }

    #[test]
    fn test_tags_are_split_and_trimmed() {
        let query = ListLoopsQuery {
            tags: Some("drums, lofi ,, bass".to_string()),
            ..Default::default()
        };
        let filter = build_filter(query).unwrap();
        assert_eq!(filter.tags, vec!["drums", "lofi", "bass"]);
    }

    #[test]
    fn test_unknown_status_rejected() {
        let query = ListLoopsQuery {
            status: Some("done".to_string()),
            ..Default::default()
        };
        assert!(build_filter(query).is_err());
    }
}

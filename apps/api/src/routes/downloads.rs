//! Download REST route handlers
//!
//! - `POST /loops/{id_or_slug}/downloads` - Record a certified download
//! - `GET /downloads` - Own download history
//! - `GET /downloads/verify/{hash}` - Verify a download certificate
//!
//! Each download gets a certificate hash binding the loop's content hash
//! to the downloading user and timestamp. The download counter counts
//! distinct users. A new-download event is published for the owner,
//! except on self-download.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use loopcast_queue::{EventType, NotificationEvent, QueueClient, QueueName};
use loopcast_shared_config::StorageConfig;

use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthUser;
use crate::models::{Page, PageMeta};
use crate::repositories::download::DownloadRecord;
use crate::repositories::{DownloadRepository, LoopRepository};
use crate::services::notifications::should_notify;
use crate::services::storage::certificate_hash;

const LICENSE_TEXT: &str =
    "Free to use / No attribution required. Redistribution of unmodified files is prohibited.";

/// Shared application state for download handlers
#[derive(Clone)]
pub struct DownloadsState {
    pub downloads: Arc<DownloadRepository>,
    pub loops: Arc<LoopRepository>,
    pub queue: QueueClient,
    pub storage: StorageConfig,
}

impl DownloadsState {
    pub fn new(
        downloads: DownloadRepository,
        loops: Arc<LoopRepository>,
        queue: QueueClient,
        storage: StorageConfig,
    ) -> Self {
        Self {
            downloads: Arc::new(downloads),
            loops,
            queue,
            storage,
        }
    }
}

/// Create the downloads router
pub fn downloads_router(state: DownloadsState) -> Router {
    Router::new()
        .route("/loops/{id_or_slug}/downloads", post(download_loop))
        .route("/downloads", get(download_history))
        .route("/downloads/verify/{hash}", get(verify_certificate))
        .with_state(state)
}

/// Certificate issued with each download
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadCertificate {
    pub certificate_hash: String,
    pub loop_title: String,
    pub loop_id: uuid::Uuid,
    pub file_hash: String,
    pub username: String,
    pub downloaded_at: String,
    pub license: &'static str,
}

/// Download response: the certificate plus where to fetch the file
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadResponse {
    pub file: String,
    pub certificate: DownloadCertificate,
}

/// Pagination query
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

async fn download_loop(
    State(state): State<DownloadsState>,
    auth: AuthUser,
    Path(id_or_slug): Path<String>,
) -> ApiResult<Json<DownloadResponse>> {
    let loop_row = state
        .loops
        .resolve(&id_or_slug)
        .await?
        .ok_or_else(|| ApiError::not_found("loop", &id_or_slug))?;

    // The original must still be on disk; a missing file means the loop
    // is a stale row, not a server fault
    let absolute = state.storage.resolve(&loop_row.original_file);
    if tokio::fs::metadata(&absolute).await.is_err() {
        tracing::error!(
            loop_id = %loop_row.id,
            path = %absolute.display(),
            "Download failed: original file missing"
        );
        return Err(ApiError::AudioFileNotFound(loop_row.original_file.clone()));
    }

    let downloaded_at = chrono::Utc::now().to_rfc3339();
    let cert_hash = certificate_hash(loop_row.id, auth.user_id, &loop_row.file_hash, &downloaded_at);

    let first_download = !state
        .downloads
        .has_downloaded(loop_row.id, auth.user_id)
        .await?;

    state
        .downloads
        .create(loop_row.id, auth.user_id, &cert_hash, None)
        .await?;

    // Distinct-user counting: repeat downloads by the same user don't
    // inflate the counter
    if first_download {
        state.loops.increment_download_count(loop_row.id).await?;
    }

    if should_notify(auth.user_id, loop_row.user_id) {
        let event = NotificationEvent::new(
            EventType::NewDownload,
            loop_row.user_id,
            json!({
                "loopId": loop_row.id,
                "loopTitle": loop_row.title,
                "downloaderUsername": auth.username,
            }),
        );
        state.queue.publish(QueueName::Notifications, &event).await?;
    }

    Ok(Json(DownloadResponse {
        file: loop_row.original_file.clone(),
        certificate: DownloadCertificate {
            certificate_hash: cert_hash,
            loop_title: loop_row.title,
            loop_id: loop_row.id,
            file_hash: loop_row.file_hash,
            username: auth.username,
            downloaded_at,
            license: LICENSE_TEXT,
        },
    }))
}

async fn download_history(
    State(state): State<DownloadsState>,
    auth: AuthUser,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page<DownloadRecord>>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let (downloads, total) = state
        .downloads
        .list_by_user(auth.user_id, limit, (page - 1) * limit)
        .await?;

    Ok(Json(Page {
        meta: PageMeta::new(total, page, limit),
        data: downloads,
    }))
}

async fn verify_certificate(
    State(state): State<DownloadsState>,
    Path(hash): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    match state.downloads.find_by_certificate(&hash).await? {
        Some(record) => Ok(Json(json!({
            "valid": true,
            "certificate": {
                "loopTitle": record.loop_title,
                "loopId": record.loop_id,
                "fileHash": record.file_hash,
                "username": record.username,
                "downloadedAt": record.downloaded_at,
                "license": LICENSE_TEXT,
            },
        }))),
        None => Ok(Json(json!({
            "valid": false,
            "message": "Certificate not found",
        }))),
    }
}

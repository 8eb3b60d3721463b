//! Health check endpoint

use axum::{routing::get, Json, Router};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
}

/// Create the health router
pub fn health_router() -> Router {
    Router::new().route("/", get(health))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "loopcast-api",
        version: env!("CARGO_PKG_VERSION"),
    })
}

//! Loopcast API server library
//!
//! HTTP process of the loop sharing platform: upload and browse endpoints,
//! social features (comments, ratings, downloads), notification fan-out
//! and the live websocket push channel. Media processing itself happens
//! in the separate worker binary; the two communicate only through the
//! message broker and the database.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod websocket;

pub use error::{ApiError, ApiResult, ErrorResponse};

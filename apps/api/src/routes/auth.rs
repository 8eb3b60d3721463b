//! Authentication REST route handlers
//!
//! - `POST /auth/register` - Create a new user account
//! - `POST /auth/login` - Authenticate and get an access token

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::models::PublicUser;
use crate::repositories::UserRepository;
use crate::services::AuthService;

const MIN_PASSWORD_LEN: usize = 8;
const MAX_USERNAME_LEN: usize = 32;

/// Shared application state for auth handlers
#[derive(Clone)]
pub struct AuthState {
    pub auth_service: Arc<AuthService>,
    pub users: Arc<UserRepository>,
}

impl AuthState {
    pub fn new(auth_service: AuthService, users: UserRepository) -> Self {
        Self {
            auth_service: Arc::new(auth_service),
            users: Arc::new(users),
        }
    }
}

/// Create the authentication router
pub fn auth_router(state: AuthState) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .with_state(state)
}

// ========== Request/Response Types ==========

/// Registration request body
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Successful auth response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}

// ========== Handlers ==========

async fn register(
    State(state): State<AuthState>,
    Json(body): Json<RegisterRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let username = body.username.trim();
    if username.is_empty() || username.len() > MAX_USERNAME_LEN {
        return Err(ApiError::ValidationError(format!(
            "username must be 1-{} characters",
            MAX_USERNAME_LEN
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ApiError::ValidationError(
            "username may only contain letters, digits, '-' and '_'".to_string(),
        ));
    }
    if !body.email.contains('@') {
        return Err(ApiError::ValidationError("invalid email address".to_string()));
    }
    if body.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::ValidationError(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    if state.users.exists(username, &body.email).await? {
        return Err(ApiError::conflict("user", username));
    }

    let password_hash = state.auth_service.hash_password(&body.password)?;
    let user = state
        .users
        .create(username, &body.email, &password_hash)
        .await?;

    tracing::info!(user_id = %user.id, username = %user.username, "User registered");

    let token = state.auth_service.issue_token(&user)?;
    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

async fn login(
    State(state): State<AuthState>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let user = state
        .users
        .find_by_username(body.username.trim())
        .await?
        .ok_or(ApiError::Unauthorized)?;

    if !state
        .auth_service
        .verify_password(&user.password_hash, &body.password)
    {
        return Err(ApiError::Unauthorized);
    }

    let token = state.auth_service.issue_token(&user)?;
    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

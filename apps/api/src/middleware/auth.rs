//! Bearer-token authentication extractor
//!
//! Handlers that take an [`AuthUser`] argument require a valid access
//! token; extraction fails with 401 otherwise.

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, HeaderMap};
use uuid::Uuid;

use crate::error::ApiError;
use crate::services::AuthService;

/// The authenticated caller of a request
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub username: String,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_service = parts
            .extensions
            .get::<AuthService>()
            .ok_or_else(|| ApiError::Internal("AuthService extension missing".to_string()))?;

        let token = extract_bearer_token(&parts.headers).ok_or(ApiError::Unauthorized)?;
        let claims = auth_service.verify_token(token)?;

        Ok(AuthUser {
            user_id: claims.sub,
            username: claims.username,
        })
    }
}

/// Extract a bearer token from the Authorization header (case-insensitive
/// scheme, trailing garbage rejected)
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())?;

    let mut parts = value.split_whitespace();
    let scheme = parts.next()?;
    let token = parts.next()?;

    if parts.next().is_some() {
        return None;
    }

    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, value.parse().unwrap());
        headers
    }

    #[test]
    fn test_extracts_bearer_token() {
        assert_eq!(
            extract_bearer_token(&headers_with("Bearer abc123")),
            Some("abc123")
        );
    }

    #[test]
    fn test_scheme_is_case_insensitive() {
        assert_eq!(
            extract_bearer_token(&headers_with("bearer abc123")),
            Some("abc123")
        );
        assert_eq!(
            extract_bearer_token(&headers_with("BEARER abc123")),
            Some("abc123")
        );
    }

    #[test]
    fn test_rejects_malformed_values() {
        assert_eq!(extract_bearer_token(&headers_with("Bearer")), None);
        assert_eq!(extract_bearer_token(&headers_with("Bearer a b")), None);
        assert_eq!(extract_bearer_token(&headers_with("Basic abc123")), None);
        assert_eq!(extract_bearer_token(&HeaderMap::new()), None);
    }
}

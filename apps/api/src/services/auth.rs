//! Password hashing and access token issuance
//!
//! Argon2 for password storage, HS256 JWTs for stateless access tokens.

use std::sync::Arc;

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::User;

/// Auth service configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_expiry_hours: i64,
}

/// Access token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: Uuid,
    /// Username at issuance time
    pub username: String,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Expiry (Unix seconds)
    pub exp: i64,
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    token_expiry_hours: i64,
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    keys: Arc<Keys>,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        Self {
            keys: Arc::new(Keys {
                encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
                decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
                token_expiry_hours: config.token_expiry_hours,
            }),
        }
    }

    /// Hash a password for storage
    pub fn hash_password(&self, password: &str) -> ApiResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| ApiError::Internal(format!("password hashing failed: {}", e)))
    }

    /// Check a password against a stored hash
    ///
    /// An unparseable stored hash verifies as false rather than erroring,
    /// so corrupted rows cannot be used to log in.
    pub fn verify_password(&self, stored_hash: &str, password: &str) -> bool {
        PasswordHash::new(stored_hash)
            .map(|parsed| {
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }

    /// Issue an access token for a user
    pub fn issue_token(&self, user: &User) -> ApiResult<String> {
        let now = chrono::Utc::now();
        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            iat: now.timestamp(),
            exp: (now + chrono::Duration::hours(self.keys.token_expiry_hours)).timestamp(),
        };
        Ok(jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &self.keys.encoding,
        )?)
    }

    /// Verify an access token and return its claims
    pub fn verify_token(&self, token: &str) -> ApiResult<Claims> {
        jsonwebtoken::decode::<Claims>(token, &self.keys.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| ApiError::InvalidToken(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn service() -> AuthService {
        AuthService::new(AuthConfig {
            jwt_secret: "test-secret-at-least-32-characters!!".to_string(),
            token_expiry_hours: 1,
        })
    }

    fn test_user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "dustloop".to_string(),
            email: "dust@example.com".to_string(),
            password_hash: String::new(),
            avatar_url: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_password_round_trip() {
        let auth = service();
        let hash = auth.hash_password("hunter2hunter2").unwrap();
        assert!(auth.verify_password(&hash, "hunter2hunter2"));
        assert!(!auth.verify_password(&hash, "wrong-password"));
    }

    #[test]
    fn test_garbage_hash_never_verifies() {
        let auth = service();
        assert!(!auth.verify_password("not-a-phc-string", "anything"));
    }

    #[test]
    fn test_token_round_trip() {
        let auth = service();
        let user = test_user();
        let token = auth.issue_token(&user).unwrap();
        let claims = auth.verify_token(&token).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.username, user.username);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_token_with_wrong_secret_rejected() {
        let auth = service();
        let other = AuthService::new(AuthConfig {
            jwt_secret: "a-completely-different-secret-value!".to_string(),
            token_expiry_hours: 1,
        });
        let token = auth.issue_token(&test_user()).unwrap();
        assert!(other.verify_token(&token).is_err());
    }

    #[test]
    fn test_malformed_token_rejected() {
        let auth = service();
        assert!(auth.verify_token("definitely.not.a-jwt").is_err());
    }
}

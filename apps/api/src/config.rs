//! API server configuration loaded from environment variables

use anyhow::Result;
use loopcast_shared_config::{
    AmqpConfig, CommonConfig, DatabaseConfig, Environment, StorageConfig,
};

/// Default maximum accepted upload size in bytes (50 MB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// API configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Common configuration shared with other services
    pub common: CommonConfig,

    /// HTTP listen port
    pub port: u16,

    /// Secret used to sign access tokens
    pub jwt_secret: String,

    /// Access token lifetime in hours
    pub token_expiry_hours: i64,

    /// Maximum accepted upload size in bytes
    pub max_upload_bytes: usize,

    /// Allowed CORS origins; unset means permissive in development and
    /// locked down in production
    pub cors_allowed_origins: Option<Vec<String>>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let common = CommonConfig::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

        let jwt_secret = loopcast_shared_config::get_env_or_default(
            "JWT_SECRET",
            "loopcast-dev-secret-do-not-use-in-production",
        );
        if common.environment.is_production()
            && jwt_secret == "loopcast-dev-secret-do-not-use-in-production"
        {
            anyhow::bail!("JWT_SECRET must be set in production");
        }

        let cors_allowed_origins = std::env::var("CORS_ORIGINS").ok().map(|raw| {
            raw.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        });

        Ok(Self {
            common,
            port: loopcast_shared_config::parse_env("PORT", 3001)
                .map_err(|e| anyhow::anyhow!("Invalid PORT value: {}", e))?,
            jwt_secret,
            token_expiry_hours: loopcast_shared_config::parse_env("JWT_EXPIRY_HOURS", 24)
                .map_err(|e| anyhow::anyhow!("Invalid JWT_EXPIRY_HOURS value: {}", e))?,
            max_upload_bytes: loopcast_shared_config::parse_env(
                "MAX_UPLOAD_BYTES",
                DEFAULT_MAX_UPLOAD_BYTES,
            )
            .map_err(|e| anyhow::anyhow!("Invalid MAX_UPLOAD_BYTES value: {}", e))?,
            cors_allowed_origins,
        })
    }

    // Convenience accessors for common config fields

    /// Get database configuration
    pub fn database(&self) -> &DatabaseConfig {
        &self.common.database
    }

    /// Get broker configuration
    pub fn amqp(&self) -> &AmqpConfig {
        &self.common.amqp
    }

    /// Get upload storage configuration
    pub fn storage(&self) -> &StorageConfig {
        &self.common.storage
    }

    /// Get environment mode
    pub fn environment(&self) -> Environment {
        self.common.environment
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.common.environment.is_production()
    }
}

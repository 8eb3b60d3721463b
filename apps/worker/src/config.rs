//! Worker configuration loaded from environment variables
//!
//! Configuration is loaded from environment variables with sensible
//! defaults for development environments.

use std::time::Duration;

use anyhow::Result;
use loopcast_shared_config::{
    AmqpConfig, CommonConfig, DatabaseConfig, Environment, StorageConfig,
};

/// Worker configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Common configuration shared with other services
    pub common: CommonConfig,

    /// Upper bound in seconds for each external process invocation
    /// (transcode, probe, waveform decode)
    pub job_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let common = CommonConfig::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

        let job_timeout_secs = loopcast_shared_config::parse_env("WORKER_JOB_TIMEOUT", 120)
            .map_err(|e| anyhow::anyhow!("Invalid WORKER_JOB_TIMEOUT value: {}", e))?;

        Ok(Self {
            common,
            job_timeout_secs,
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

    /// Job timeout as a `Duration`
    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_secs)
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Tests that touch process environment must not run in parallel
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn test_default_job_timeout() {
        let _lock = ENV_MUTEX.lock().unwrap();
        env::remove_var("WORKER_JOB_TIMEOUT");

        let timeout: u64 = loopcast_shared_config::parse_env("WORKER_JOB_TIMEOUT", 120).unwrap();
        assert_eq!(timeout, 120);
    }

    #[test]
    fn test_custom_job_timeout() {
        let _lock = ENV_MUTEX.lock().unwrap();
        env::set_var("WORKER_JOB_TIMEOUT", "30");

        let timeout: u64 = loopcast_shared_config::parse_env("WORKER_JOB_TIMEOUT", 120).unwrap();
        assert_eq!(timeout, 30);

        env::remove_var("WORKER_JOB_TIMEOUT");
    }

    #[test]
    fn test_invalid_job_timeout_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        env::set_var("WORKER_JOB_TIMEOUT", "not_a_number");

        let result: Result<u64, _> = loopcast_shared_config::parse_env("WORKER_JOB_TIMEOUT", 120);
        assert!(result.is_err());

        env::remove_var("WORKER_JOB_TIMEOUT");
    }
}

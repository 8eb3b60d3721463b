//! Message broker configuration types

use crate::{get_env_or_default, parse_env, ConfigResult};

/// AMQP broker configuration
#[derive(Debug, Clone)]
pub struct AmqpConfig {
    /// Broker connection URL
    pub url: String,

    /// Delay between reconnection attempts in seconds
    ///
    /// Broker unavailability is treated as transient: both the API and the
    /// worker retry indefinitely at this fixed interval.
    pub reconnect_delay_secs: u64,
}

impl AmqpConfig {
    /// Load broker configuration from environment variables
    pub fn from_env() -> ConfigResult<Self> {
        Ok(Self {
            url: get_env_or_default("AMQP_URL", "amqp://localhost:5672"),
            reconnect_delay_secs: parse_env("AMQP_RECONNECT_DELAY", 5)?,
        })
    }

    /// Create a configuration with a custom URL (useful for testing)
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reconnect_delay_secs: 5,
        }
    }
}

impl Default for AmqpConfig {
    fn default() -> Self {
        Self {
            url: "amqp://localhost:5672".to_string(),
            reconnect_delay_secs: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AmqpConfig::default();
        assert_eq!(config.url, "amqp://localhost:5672");
        assert_eq!(config.reconnect_delay_secs, 5);
    }

    #[test]
    fn test_with_url() {
        let config = AmqpConfig::with_url("amqp://broker:5672");
        assert_eq!(config.url, "amqp://broker:5672");
    }
}

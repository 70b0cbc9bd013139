use crate::{env_parse_or, ConfigError, FromEnv};
use std::time::Duration;

/// Fixed-window request budget per client IP.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub window: Duration,
    pub max_requests: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(15 * 60),
            max_requests: 100,
        }
    }
}

impl FromEnv for RateLimitConfig {
    /// - RATE_LIMIT_WINDOW_SECS: defaults to 900
    /// - RATE_LIMIT_MAX: defaults to 100, must be positive
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let window_secs = env_parse_or("RATE_LIMIT_WINDOW_SECS", defaults.window.as_secs())?;
        let max_requests = env_parse_or("RATE_LIMIT_MAX", defaults.max_requests)?;

        if window_secs == 0 {
            return Err(ConfigError::ParseError {
                key: "RATE_LIMIT_WINDOW_SECS".to_string(),
                details: "must be greater than zero".to_string(),
            });
        }
        if max_requests == 0 {
            return Err(ConfigError::ParseError {
                key: "RATE_LIMIT_MAX".to_string(),
                details: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            window: Duration::from_secs(window_secs),
            max_requests,
        })
    }
}

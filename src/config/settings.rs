use std::env;
use std::time::Duration;

use crate::error::TokenError;
use crate::utils::constants::{
    DEFAULT_HTTP_TIMEOUT_MS, DEFAULT_REFRESH_THRESHOLD, ENV_HTTP_TIMEOUT_MS,
    ENV_REFRESH_THRESHOLD,
};

/// Process-level knobs for the cache.
///
/// Passed explicitly into [`crate::ManagerRegistry::new`]; tests can supply
/// arbitrary values without touching process-global state. Range validation
/// of the threshold happens at manager/registry construction.
#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// Fraction of a token's declared lifetime after which it is refreshed.
    pub refresh_threshold: f64,
    /// Request timeout handed to the HTTP client shared by all managers.
    pub http_timeout: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            refresh_threshold: DEFAULT_REFRESH_THRESHOLD,
            http_timeout: Duration::from_millis(DEFAULT_HTTP_TIMEOUT_MS),
        }
    }
}

impl CacheSettings {
    /// Starts from the defaults and applies the optional environment
    /// overrides `IAM_TOKEN_REFRESH_THRESHOLD` and `IAM_TOKEN_HTTP_TIMEOUT_MS`.
    pub fn from_env() -> Result<Self, TokenError> {
        let mut settings = Self::default();
        if let Ok(raw) = env::var(ENV_REFRESH_THRESHOLD) {
            settings.refresh_threshold = raw.trim().parse::<f64>().map_err(|_| {
                TokenError::InvalidConfiguration(format!(
                    "{ENV_REFRESH_THRESHOLD} is not a number: '{raw}'"
                ))
            })?;
        }
        if let Ok(raw) = env::var(ENV_HTTP_TIMEOUT_MS) {
            let millis = raw.trim().parse::<u64>().map_err(|_| {
                TokenError::InvalidConfiguration(format!(
                    "{ENV_HTTP_TIMEOUT_MS} is not a millisecond count: '{raw}'"
                ))
            })?;
            settings.http_timeout = Duration::from_millis(millis);
        }
        Ok(settings)
    }
}

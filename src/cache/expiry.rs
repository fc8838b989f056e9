use std::time::Duration;

use tokio::time::Instant;

use crate::error::TokenError;
use crate::utils::constants::{
    DEFAULT_REFRESH_THRESHOLD, REFRESH_THRESHOLD_MAX, REFRESH_THRESHOLD_MIN,
};

/// Fraction of a token's declared lifetime after which it is proactively
/// treated as stale, so a token never expires mid-request.
///
/// Valid strictly inside (0.1, 1.0); construction rejects anything else.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpiryThreshold(f64);

impl ExpiryThreshold {
    pub fn new(value: f64) -> Result<Self, TokenError> {
        // NaN fails both comparisons and lands in the error arm
        if !(value > REFRESH_THRESHOLD_MIN && value < REFRESH_THRESHOLD_MAX) {
            return Err(TokenError::InvalidConfiguration(format!(
                "refresh threshold must lie strictly between {REFRESH_THRESHOLD_MIN} and {REFRESH_THRESHOLD_MAX}, got {value}"
            )));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl Default for ExpiryThreshold {
    fn default() -> Self {
        Self(DEFAULT_REFRESH_THRESHOLD)
    }
}

/// Refresh deadline for a token issued at `now` with the given declared
/// lifetime: `now + floor(lifetime * threshold)` seconds.
pub fn refresh_deadline(now: Instant, lifetime_seconds: u64, threshold: ExpiryThreshold) -> Instant {
    let window = (lifetime_seconds as f64 * threshold.value()) as u64;
    now + Duration::from_secs(window)
}

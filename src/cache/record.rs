use tokio::time::Instant;

use crate::cache::expiry::{refresh_deadline, ExpiryThreshold};

/// One issued bearer token plus its derived refresh deadline.
///
/// Records are immutable: a refresh installs a whole new record, so
/// concurrent readers never observe a half-updated one. The deadline is
/// computed here from the declared lifetime, never taken from the server.
#[derive(Debug, Clone)]
pub struct TokenRecord {
    access_token: String,
    lifetime_seconds: u64,
    refresh_deadline: Instant,
}

impl TokenRecord {
    pub(crate) fn issue(
        access_token: String,
        lifetime_seconds: u64,
        issued_at: Instant,
        threshold: ExpiryThreshold,
    ) -> Self {
        Self {
            access_token,
            lifetime_seconds,
            refresh_deadline: refresh_deadline(issued_at, lifetime_seconds, threshold),
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn lifetime_seconds(&self) -> u64 {
        self.lifetime_seconds
    }

    /// True once the token has entered its refresh window.
    pub fn needs_refresh(&self, now: Instant) -> bool {
        now >= self.refresh_deadline
    }
}

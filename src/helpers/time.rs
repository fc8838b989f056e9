use tokio::time::Instant;

/// Monotonic clock read for expiry decisions. Wall clocks can jump under
/// NTP adjustment in long-running processes; `tokio::time::Instant` cannot,
/// and it obeys the paused test clock.
pub fn now() -> Instant {
    Instant::now()
}

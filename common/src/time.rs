//! Time constants for OrderDesk.

use chrono::{DateTime, Duration, Utc};

/// Default age, in seconds, after which a cached exchange rate is stale.
pub const CACHE_EXPIRATION_SECONDS: i64 = 3600;

/// Default timeout for a single rate provider request.
pub const PROVIDER_TIMEOUT_SECONDS: u64 = 10;

/// Default cache expiration window.
pub fn default_cache_expiration() -> Duration {
    Duration::seconds(CACHE_EXPIRATION_SECONDS)
}

/// Whether a value observed at `observed_at` is older than `ttl` at `now`.
///
/// An age exactly equal to `ttl` is still fresh.
pub fn is_expired(observed_at: DateTime<Utc>, now: DateTime<Utc>, ttl: Duration) -> bool {
    now.signed_duration_since(observed_at) > ttl
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_expiration() {
        assert_eq!(default_cache_expiration(), Duration::hours(1));
    }

    #[test]
    fn test_is_expired_boundary() {
        let now = Utc::now();
        let ttl = Duration::seconds(60);

        assert!(!is_expired(now, now, ttl));
        assert!(!is_expired(now - ttl, now, ttl));
        assert!(is_expired(now - ttl - Duration::seconds(1), now, ttl));
    }
}

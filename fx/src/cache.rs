//! Durable exchange rate cache with TTL expiry.
//!
//! Entries are kept in memory and mirrored to a JSON file mapping each
//! currency code to a `[fetched_at, rate]` pair. A missing or unreadable file
//! yields an empty cache.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use orderdesk_common::{is_expired, Currency};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{FxError, FxResult};

/// A rate as last fetched from the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedRate {
    pub currency: Currency,
    pub fetched_at: DateTime<Utc>,
    pub rate: Decimal,
}

impl CachedRate {
    /// Whether the entry is older than `ttl` at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        is_expired(self.fetched_at, now, ttl)
    }
}

/// On-disk shape of one entry.
#[derive(Debug, Serialize, Deserialize)]
struct CacheRecord(
    DateTime<Utc>,
    #[serde(with = "rust_decimal::serde::float")] Decimal,
);

type CacheFile = BTreeMap<String, CacheRecord>;

/// Thread-safe rate cache, optionally backed by a file.
///
/// All mutations and file writes happen under a single lock so concurrent
/// refreshes cannot interleave a read-modify-write of the file.
pub struct RateCache {
    path: Option<PathBuf>,
    entries: Mutex<HashMap<Currency, CachedRate>>,
}

impl RateCache {
    /// Open a file-backed cache, loading whatever valid entries the file holds.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match load_file(&path) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable rate cache");
                HashMap::new()
            }
        };

        debug!(path = %path.display(), entries = entries.len(), "Rate cache opened");

        Self {
            path: Some(path),
            entries: Mutex::new(entries),
        }
    }

    /// Create a cache that lives only in memory.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Get the entry for a currency, stale or not.
    pub fn get(&self, currency: &Currency) -> Option<CachedRate> {
        self.entries.lock().get(currency).cloned()
    }

    /// Insert or overwrite the entry for a currency, stamped with `now`.
    ///
    /// The in-memory entry is updated even when writing the file fails. The
    /// file is written on the calling thread, so async callers should run this
    /// on the blocking pool.
    pub fn put(&self, currency: &Currency, rate: Decimal, now: DateTime<Utc>) -> FxResult<()> {
        if rate <= Decimal::ZERO {
            return Err(FxError::InvalidUpstreamResponse(format!(
                "non-positive rate {} for {}",
                rate, currency
            )));
        }

        let mut entries = self.entries.lock();
        entries.insert(
            currency.clone(),
            CachedRate {
                currency: currency.clone(),
                fetched_at: now,
                rate,
            },
        );
        self.persist(&entries)
    }

    /// Remove every entry older than `ttl` at `now`.
    pub fn evict_expired(&self, now: DateTime<Utc>, ttl: Duration) {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now, ttl));
        let evicted = before - entries.len();

        if evicted == 0 {
            return;
        }

        debug!(evicted, remaining = entries.len(), "Evicted expired rates");
        if let Err(e) = self.persist(&entries) {
            warn!(error = %e, "Failed to persist rate cache after eviction");
        }
    }

    /// Get the number of entries in cache.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Check if cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Get cache statistics as of `now`.
    pub fn stats(&self, now: DateTime<Utc>, ttl: Duration) -> CacheStats {
        let entries = self.entries.lock();
        let total = entries.len();
        let valid = entries.values().filter(|e| !e.is_expired(now, ttl)).count();

        CacheStats {
            total_entries: total,
            valid_entries: valid,
            expired_entries: total - valid,
        }
    }

    fn persist(&self, entries: &HashMap<Currency, CachedRate>) -> FxResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let file: CacheFile = entries
            .values()
            .map(|e| (e.currency.code().to_string(), CacheRecord(e.fetched_at, e.rate)))
            .collect();

        write_file(path, &file).map_err(|e| {
            FxError::CachePersist(format!("{}: {}", path.display(), e))
        })
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub valid_entries: usize,
    pub expired_entries: usize,
}

/// Shared rate cache.
pub type SharedRateCache = Arc<RateCache>;

fn load_file(path: &Path) -> FxResult<HashMap<Currency, CachedRate>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(HashMap::new()),
        Err(e) => return Err(FxError::CacheCorrupt(e.to_string())),
    };

    if raw.trim().is_empty() {
        return Ok(HashMap::new());
    }

    let file: CacheFile =
        serde_json::from_str(&raw).map_err(|e| FxError::CacheCorrupt(e.to_string()))?;

    Ok(file
        .into_iter()
        .filter(|(_, CacheRecord(_, rate))| *rate > Decimal::ZERO)
        .map(|(code, CacheRecord(fetched_at, rate))| {
            let currency = Currency::new(code);
            let entry = CachedRate {
                currency: currency.clone(),
                fetched_at,
                rate,
            };
            (currency, entry)
        })
        .collect())
}

fn write_file(path: &Path, file: &CacheFile) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_vec_pretty(file).map_err(io::Error::other)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn ttl() -> Duration {
        Duration::seconds(3600)
    }

    #[test]
    fn test_cache_put_and_get() {
        let cache = RateCache::in_memory();
        let now = Utc::now();

        cache.put(&Currency::usd(), dec!(4.5), now).unwrap();

        let cached = cache.get(&Currency::usd()).unwrap();
        assert_eq!(cached.rate, dec!(4.5));
        assert_eq!(cached.fetched_at, now);
        assert_eq!(cached.currency, Currency::usd());
    }

    #[test]
    fn test_cache_miss() {
        let cache = RateCache::in_memory();
        assert!(cache.get(&Currency::eur()).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_get_returns_stale_entries() {
        let cache = RateCache::in_memory();
        let old = Utc::now() - ttl() - Duration::seconds(10);

        cache.put(&Currency::usd(), dec!(4.5), old).unwrap();

        let cached = cache.get(&Currency::usd()).unwrap();
        assert!(cached.is_expired(Utc::now(), ttl()));
    }

    #[test]
    fn test_put_overwrites() {
        let cache = RateCache::in_memory();
        let now = Utc::now();

        cache.put(&Currency::usd(), dec!(4.5), now - Duration::seconds(5)).unwrap();
        cache.put(&Currency::usd(), dec!(4.6), now).unwrap();

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&Currency::usd()).unwrap().rate, dec!(4.6));
    }

    #[test]
    fn test_put_rejects_non_positive_rate() {
        let cache = RateCache::in_memory();

        let result = cache.put(&Currency::usd(), Decimal::ZERO, Utc::now());

        assert!(matches!(result, Err(FxError::InvalidUpstreamResponse(_))));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_evict_expired_keeps_fresh_entries() {
        let cache = RateCache::in_memory();
        let now = Utc::now();

        cache
            .put(&Currency::usd(), dec!(4.5), now - ttl() - Duration::seconds(1))
            .unwrap();
        cache.put(&Currency::eur(), dec!(4.0), now).unwrap();

        cache.evict_expired(now, ttl());

        assert!(cache.get(&Currency::usd()).is_none());
        assert!(cache.get(&Currency::eur()).is_some());
        assert_eq!(cache.len(), 1);

        // Second pass has nothing to do
        cache.evict_expired(now, ttl());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_evict_keeps_entry_exactly_at_ttl() {
        let cache = RateCache::in_memory();
        let now = Utc::now();

        cache.put(&Currency::gbp(), dec!(5.1), now - ttl()).unwrap();
        cache.evict_expired(now, ttl());

        assert!(cache.get(&Currency::gbp()).is_some());
    }

    #[test]
    fn test_stats() {
        let cache = RateCache::in_memory();
        let now = Utc::now();

        cache
            .put(&Currency::usd(), dec!(4.5), now - ttl() - Duration::seconds(1))
            .unwrap();
        cache.put(&Currency::eur(), dec!(4.0), now).unwrap();

        let stats = cache.stats(now, ttl());
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.valid_entries, 1);
        assert_eq!(stats.expired_entries, 1);
    }

    #[test]
    fn test_cache_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rates.json");
        let now = Utc::now();

        {
            let cache = RateCache::open(&path);
            cache.put(&Currency::usd(), dec!(4.5), now).unwrap();
        }

        let reopened = RateCache::open(&path);
        let cached = reopened.get(&Currency::usd()).unwrap();
        assert_eq!(cached.rate, dec!(4.5));
        assert_eq!(cached.fetched_at, now);
    }

    #[test]
    fn test_file_format_is_code_to_pair() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rates.json");

        let cache = RateCache::open(&path);
        cache.put(&Currency::usd(), dec!(4.5), Utc::now()).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let pair = value["USD"].as_array().unwrap();
        assert_eq!(pair.len(), 2);
        assert!(pair[0].is_string());
        assert_eq!(pair[1].as_f64(), Some(4.5));
    }

    #[test]
    fn test_missing_file_is_empty_cache() {
        let dir = tempdir().unwrap();
        let cache = RateCache::open(dir.path().join("absent.json"));

        assert!(cache.is_empty());
    }

    #[test]
    fn test_corrupt_file_is_empty_cache() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rates.json");
        fs::write(&path, "{ not json").unwrap();

        let cache = RateCache::open(&path);
        assert!(cache.is_empty());

        // The next write replaces the corrupt contents
        cache.put(&Currency::eur(), dec!(4.3), Utc::now()).unwrap();
        let reopened = RateCache::open(&path);
        assert_eq!(reopened.get(&Currency::eur()).unwrap().rate, dec!(4.3));
    }

    #[test]
    fn test_load_drops_non_positive_rates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rates.json");
        fs::write(
            &path,
            r#"{"USD": ["2026-01-01T00:00:00Z", 4.5], "EUR": ["2026-01-01T00:00:00Z", 0]}"#,
        )
        .unwrap();

        let cache = RateCache::open(&path);
        assert!(cache.get(&Currency::usd()).is_some());
        assert!(cache.get(&Currency::eur()).is_none());
    }

    #[test]
    fn test_eviction_is_persisted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rates.json");
        let now = Utc::now();

        let cache = RateCache::open(&path);
        cache
            .put(&Currency::usd(), dec!(4.5), now - ttl() - Duration::seconds(1))
            .unwrap();
        cache.put(&Currency::eur(), dec!(4.0), now).unwrap();
        cache.evict_expired(now, ttl());

        let reopened = RateCache::open(&path);
        assert!(reopened.get(&Currency::usd()).is_none());
        assert!(reopened.get(&Currency::eur()).is_some());
    }

    #[test]
    fn test_concurrent_puts_for_different_keys() {
        let dir = tempdir().unwrap();
        let cache = Arc::new(RateCache::open(dir.path().join("rates.json")));
        let codes = ["USD", "EUR", "GBP", "CHF", "JPY", "NOK"];

        let handles: Vec<_> = codes
            .iter()
            .enumerate()
            .map(|(i, code)| {
                let cache = cache.clone();
                let currency = Currency::new(*code);
                std::thread::spawn(move || {
                    cache
                        .put(&currency, Decimal::from(i as i64 + 1), Utc::now())
                        .unwrap();
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let reopened = RateCache::open(cache.path().unwrap());
        assert_eq!(reopened.len(), codes.len());
    }
}

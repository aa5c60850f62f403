//! Exchange rate fetcher and converter.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Duration, Utc};
use orderdesk_common::{default_cache_expiration, Currency};
use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};

use crate::cache::{CacheStats, RateCache, SharedRateCache};
use crate::conversion::{apply_rate, round_currency_amount};
use crate::error::{FxError, FxResult};
use crate::provider::RateProvider;

/// Default location of the rate cache file.
pub const DEFAULT_CACHE_PATH: &str = "exchange_rate_cache.json";

/// Configuration for the FX engine.
#[derive(Debug, Clone)]
pub struct FxEngineConfig {
    /// Age after which a cached rate is refreshed from the provider.
    pub cache_expiration: Duration,
    /// Currency order totals are held in. Conversions into it are identity.
    pub base_currency: Currency,
    /// Rate cache file.
    pub cache_path: PathBuf,
}

impl Default for FxEngineConfig {
    fn default() -> Self {
        Self {
            cache_expiration: default_cache_expiration(),
            base_currency: Currency::pln(),
            cache_path: PathBuf::from(DEFAULT_CACHE_PATH),
        }
    }
}

impl FxEngineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(secs) = std::env::var("CACHE_EXPIRATION_SECONDS") {
            if let Some(expiration) = parse_expiration_secs(&secs) {
                config.cache_expiration = expiration;
            }
        }

        if let Ok(path) = std::env::var("RATE_CACHE_PATH") {
            config.cache_path = PathBuf::from(path);
        }

        if let Ok(code) = std::env::var("BASE_CURRENCY") {
            config.base_currency = Currency::new(code);
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> FxResult<()> {
        if self.cache_expiration <= Duration::zero() {
            return Err(FxError::Configuration(
                "Cache expiration must be positive".to_string(),
            ));
        }

        if self.cache_path.as_os_str().is_empty() {
            return Err(FxError::Configuration(
                "Rate cache path cannot be empty".to_string(),
            ));
        }

        if self.base_currency.code().is_empty() {
            return Err(FxError::Configuration(
                "Base currency cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Parse a whole number of seconds, rejecting values chrono cannot represent.
fn parse_expiration_secs(raw: &str) -> Option<Duration> {
    raw.trim().parse().ok().and_then(Duration::try_seconds)
}

/// Fetches rates through the cache and converts order amounts.
pub struct FxEngine {
    provider: Arc<dyn RateProvider>,
    cache: SharedRateCache,
    config: FxEngineConfig,
}

impl FxEngine {
    /// Create an engine over an existing cache.
    pub fn new(provider: Arc<dyn RateProvider>, cache: SharedRateCache, config: FxEngineConfig) -> Self {
        Self {
            provider,
            cache,
            config,
        }
    }

    /// Create an engine with a cache opened from `config.cache_path`.
    pub fn with_file_cache(provider: Arc<dyn RateProvider>, config: FxEngineConfig) -> Self {
        let cache = Arc::new(RateCache::open(config.cache_path.clone()));
        Self::new(provider, cache, config)
    }

    /// The cache this engine reads and refreshes.
    pub fn cache(&self) -> &SharedRateCache {
        &self.cache
    }

    pub fn config(&self) -> &FxEngineConfig {
        &self.config
    }

    /// Get the current rate for a currency.
    ///
    /// A cached rate no older than the expiration window is returned without
    /// contacting the provider. Otherwise the provider is called once and a
    /// successful answer replaces the cache entry.
    #[instrument(skip(self, currency), fields(currency = %currency))]
    pub async fn fetch_rate(&self, currency: &Currency) -> FxResult<Decimal> {
        let now = Utc::now();

        match self.cache.get(currency) {
            Some(cached) if !cached.is_expired(now, self.config.cache_expiration) => {
                debug!(rate = %cached.rate, "Using cached rate");
                return Ok(cached.rate);
            }
            Some(_) => debug!("Cached rate expired"),
            None => debug!("Cache miss"),
        }

        let rate = self.provider.get_rate(currency).await?;

        // The cache file is rewritten on every put; keep that off the async workers.
        let cache = Arc::clone(&self.cache);
        let code = currency.clone();
        let stored = tokio::task::spawn_blocking(move || cache.put(&code, rate, Utc::now()))
            .await
            .map_err(|e| FxError::CachePersist(e.to_string()))
            .and_then(|result| result);

        match stored {
            Ok(()) => {}
            Err(FxError::CachePersist(e)) => {
                warn!(error = %e, "Rate cached in memory only");
            }
            Err(e) => return Err(e),
        }

        info!(rate = %rate, provider = self.provider.name(), "Fetched fresh rate");
        Ok(rate)
    }

    /// Convert a base-currency amount into `target`, unrounded.
    pub async fn convert(&self, amount: Decimal, target: &Currency) -> FxResult<Decimal> {
        if *target == self.config.base_currency {
            return Ok(amount);
        }

        let rate = self.fetch_rate(target).await?;
        apply_rate(amount, rate)
    }

    /// Convert into `target` and round to its display precision.
    ///
    /// The base currency passes through untouched.
    pub async fn converted_amount(&self, amount: Decimal, target: &Currency) -> FxResult<Decimal> {
        if *target == self.config.base_currency {
            return Ok(amount);
        }

        let converted = self.convert(amount, target).await?;
        Ok(round_currency_amount(converted, target))
    }

    /// Drop cached rates older than the expiration window.
    pub fn cleanup(&self) {
        self.cache
            .evict_expired(Utc::now(), self.config.cache_expiration);
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.cache.stats(Utc::now(), self.config.cache_expiration)
    }
}

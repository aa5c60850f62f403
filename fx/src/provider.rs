//! Rate provider trait and the HTTP provider for the NBP rates API.

use std::time::Duration;

use async_trait::async_trait;
use orderdesk_common::{Currency, PROVIDER_TIMEOUT_SECONDS};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{FxError, FxResult};

/// Default base URL of the NBP exchange rates API.
pub const DEFAULT_PROVIDER_URL: &str = "https://api.nbp.pl/api/exchangerates";

/// Trait for exchange rate providers.
///
/// A rate is the home-currency price of one unit of `currency`.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &str;

    /// Fetch the current mid-market rate for a currency. Never retried.
    async fn get_rate(&self, currency: &Currency) -> FxResult<Decimal>;
}

/// Configuration for the NBP provider.
#[derive(Debug, Clone)]
pub struct NbpProviderConfig {
    /// API base URL, without trailing slash.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for NbpProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PROVIDER_URL.to_string(),
            timeout: Duration::from_secs(PROVIDER_TIMEOUT_SECONDS),
        }
    }
}

impl NbpProviderConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("RATE_PROVIDER_URL") {
            config.base_url = url.trim_end_matches('/').to_string();
        }

        if let Ok(secs) = std::env::var("RATE_PROVIDER_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                config.timeout = Duration::from_secs(secs);
            }
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> FxResult<()> {
        if self.base_url.is_empty() {
            return Err(FxError::Configuration(
                "Rate provider URL cannot be empty".to_string(),
            ));
        }

        if self.timeout.is_zero() {
            return Err(FxError::Configuration(
                "Rate provider timeout cannot be 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct RatesResponse {
    #[serde(default)]
    rates: Vec<RateEntry>,
}

#[derive(Debug, Deserialize)]
struct RateEntry {
    #[serde(default, with = "rust_decimal::serde::float_option")]
    mid: Option<Decimal>,
}

/// Provider backed by the NBP table A endpoint.
pub struct NbpRateProvider {
    client: Client,
    base_url: String,
}

impl NbpRateProvider {
    /// Create a new provider.
    pub fn new(config: NbpProviderConfig) -> FxResult<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FxError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn rate_url(&self, currency: &Currency) -> String {
        format!("{}/rates/a/{}/?format=json", self.base_url, currency.code())
    }
}

#[async_trait]
impl RateProvider for NbpRateProvider {
    fn name(&self) -> &str {
        "NBP"
    }

    async fn get_rate(&self, currency: &Currency) -> FxResult<Decimal> {
        let url = self.rate_url(currency);
        debug!(currency = %currency, url = %url, "Requesting rate");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                warn!(currency = %currency, error = %e, "Rate provider request failed");
                FxError::ServiceUnavailable(e.to_string())
            })?;

        let body = response
            .text()
            .await
            .map_err(|e| FxError::ServiceUnavailable(e.to_string()))?;

        parse_mid_rate(&body)
    }
}

/// Extract the first entry's mid rate from a provider response body.
pub fn parse_mid_rate(body: &str) -> FxResult<Decimal> {
    let response: RatesResponse = serde_json::from_str(body)
        .map_err(|e| FxError::InvalidUpstreamResponse(e.to_string()))?;

    let first = response
        .rates
        .into_iter()
        .next()
        .ok_or_else(|| FxError::InvalidUpstreamResponse("empty rates list".to_string()))?;

    let mid = first
        .mid
        .ok_or_else(|| FxError::InvalidUpstreamResponse("missing mid rate".to_string()))?;

    if mid <= Decimal::ZERO {
        return Err(FxError::InvalidUpstreamResponse(format!(
            "non-positive mid rate {}",
            mid
        )));
    }

    Ok(mid)
}

/// Mock rate provider for testing.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockRateProvider {
    name: String,
    rates: parking_lot::Mutex<std::collections::HashMap<Currency, Decimal>>,
    failure: parking_lot::Mutex<Option<MockFailure>>,
    calls: std::sync::atomic::AtomicUsize,
}

/// Failure a [`MockRateProvider`] can be told to return.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Clone)]
pub enum MockFailure {
    Unavailable(String),
    InvalidResponse(String),
}

#[cfg(any(test, feature = "test-utils"))]
impl MockRateProvider {
    /// Create a new mock provider.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rates: parking_lot::Mutex::new(std::collections::HashMap::new()),
            failure: parking_lot::Mutex::new(None),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Set the rate returned for a currency.
    pub fn set_rate(&self, currency: Currency, rate: Decimal) {
        self.rates.lock().insert(currency, rate);
    }

    /// Make every subsequent call fail.
    pub fn fail_with(&self, failure: MockFailure) {
        *self.failure.lock() = Some(failure);
    }

    /// Number of `get_rate` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl RateProvider for MockRateProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_rate(&self, currency: &Currency) -> FxResult<Decimal> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        if let Some(failure) = self.failure.lock().clone() {
            return Err(match failure {
                MockFailure::Unavailable(msg) => FxError::ServiceUnavailable(msg),
                MockFailure::InvalidResponse(msg) => FxError::InvalidUpstreamResponse(msg),
            });
        }

        self.rates
            .lock()
            .get(currency)
            .copied()
            .ok_or_else(|| FxError::ServiceUnavailable(format!("404 Not Found for {}", currency)))
    }
}

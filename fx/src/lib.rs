//! OrderDesk FX
//!
//! Exchange rate acquisition and caching for order currency conversion.
//!
//! # Features
//!
//! - Durable rate cache with a configurable expiration window
//! - Single provider call per cache miss, no automatic retries
//! - Conversion from the home currency with per-currency display rounding
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use orderdesk_fx::{FxEngine, FxEngineConfig, NbpRateProvider, NbpProviderConfig};
//! use orderdesk_common::Currency;
//!
//! let provider = Arc::new(NbpRateProvider::new(NbpProviderConfig::default())?);
//! let engine = FxEngine::with_file_cache(provider, FxEngineConfig::default());
//!
//! let converted = engine.convert(total_amount, &Currency::usd()).await?;
//! let display = round_currency_amount(converted, &Currency::usd());
//! ```

pub mod engine;
pub mod provider;
pub mod cache;
pub mod conversion;
pub mod error;

pub use engine::{FxEngine, FxEngineConfig};
pub use provider::{NbpProviderConfig, NbpRateProvider, RateProvider};
pub use cache::{CachedRate, RateCache, SharedRateCache};
pub use conversion::{apply_rate, round_currency_amount};
pub use error::{FxError, FxResult};

#[cfg(any(test, feature = "test-utils"))]
pub use provider::{MockFailure, MockRateProvider};

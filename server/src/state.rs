//! Shared handler state.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use orderdesk_fx::{FxEngine, NbpRateProvider};

use crate::config::ServerConfig;
use crate::sqlite::SqliteOrderStore;
use crate::store::OrderStore;

/// Collaborators the HTTP handlers call into.
pub struct AppState {
    pub orders: Arc<dyn OrderStore>,
    pub fx: Arc<FxEngine>,
}

impl AppState {
    pub fn new(orders: Arc<dyn OrderStore>, fx: Arc<FxEngine>) -> Self {
        Self { orders, fx }
    }
}

/// Wire the production collaborators from configuration.
pub async fn build_state(config: &ServerConfig) -> anyhow::Result<Arc<AppState>> {
    let provider = NbpRateProvider::new(config.provider.clone())
        .context("Failed to create rate provider")?;

    let fx = FxEngine::with_file_cache(Arc::new(provider), config.fx.clone());
    fx.cleanup();

    info!(
        cache_path = %config.fx.cache_path.display(),
        cached_rates = fx.cache().len(),
        ttl_secs = config.fx.cache_expiration.num_seconds(),
        "FX engine ready"
    );

    let orders = SqliteOrderStore::connect(&config.database_url)
        .await
        .with_context(|| format!("Failed to open order database {}", config.database_url))?;

    Ok(Arc::new(AppState::new(Arc::new(orders), Arc::new(fx))))
}

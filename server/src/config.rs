//! Server configuration.

use std::net::SocketAddr;
use std::time::Duration;

use orderdesk_fx::{FxEngineConfig, NbpProviderConfig};

/// Default order database, relative to the working directory.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://orders.db";

/// Main server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address.
    pub listen_addr: SocketAddr,
    /// Upper bound on handling a single request.
    pub request_timeout: Duration,
    /// Log level used when `RUST_LOG` is unset.
    pub log_level: String,
    /// SQLite database holding orders.
    pub database_url: String,
    /// FX engine configuration.
    pub fx: FxEngineConfig,
    /// Rate provider configuration.
    pub provider: NbpProviderConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            request_timeout: Duration::from_secs(30),
            log_level: "info".to_string(),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            fx: FxEngineConfig::default(),
            provider: NbpProviderConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self {
            fx: FxEngineConfig::from_env(),
            provider: NbpProviderConfig::from_env(),
            ..Self::default()
        };

        if let Ok(addr) = std::env::var("ORDERDESK_LISTEN_ADDR") {
            if let Ok(addr) = addr.parse() {
                config.listen_addr = addr;
            }
        }

        if let Ok(secs) = std::env::var("ORDERDESK_REQUEST_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                config.request_timeout = Duration::from_secs(secs);
            }
        }

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.log_level = level;
        }

        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database_url = url;
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.listen_addr.port() == 0 {
            return Err("Listen port cannot be 0".to_string());
        }

        if self.request_timeout.is_zero() {
            return Err("Request timeout cannot be 0".to_string());
        }

        if !self.database_url.starts_with("sqlite:") {
            return Err("Database URL must be a sqlite: URL".to_string());
        }

        if self.request_timeout <= self.provider.timeout {
            return Err("Request timeout must exceed the rate provider timeout".to_string());
        }

        self.fx.validate().map_err(|e| e.to_string())?;
        self.provider.validate().map_err(|e| e.to_string())?;

        Ok(())
    }
}

//! Configuration model structs

mod billing;
mod external;
mod limits;
mod server;
mod storage;

pub use billing::BillingConfig;
pub use external::ExternalConfig;
pub use limits::LimitsConfig;
pub use server::ServerConfig;
pub use storage::{DatabaseConfig, RedisConfig, StorageConfig};

use crate::utils::error::Result;
use serde::{Deserialize, Serialize};

/// Top-level service configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServiceConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Storage configuration (system-of-record store + fast-path cache)
    #[serde(default)]
    pub storage: StorageConfig,
    /// Billing configuration (tax, due window, invoice build limits)
    #[serde(default)]
    pub billing: BillingConfig,
    /// Cache TTLs, circuit breaker, and rate-limit tuning
    #[serde(default)]
    pub limits: LimitsConfig,
    /// External collaborator settings (app URL, operator and PSP secrets)
    #[serde(default)]
    pub external: ExternalConfig,
}

impl ServiceConfig {
    /// Build configuration from environment variables (§6.5 names)
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("HOST") {
            config.server.host = host;
        }
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(port) = port.parse() {
                config.server.port = port;
            }
        }
        if let Ok(url) = std::env::var("STORE_URL") {
            config.storage.database.url = url;
        }
        if let Ok(url) = std::env::var("CACHE_URL") {
            config.storage.redis.url = url;
        }
        if let Ok(url) = std::env::var("APP_URL") {
            config.external.app_url = url;
        }
        if let Ok(secret) = std::env::var("CRON_SECRET") {
            config.external.cron_secret = secret;
        }
        if let Ok(secret) = std::env::var("PSP_SECRET") {
            config.external.psp_secret = secret;
        }
        if let Ok(secret) = std::env::var("PSP_WEBHOOK_SECRET") {
            config.external.psp_webhook_secret = secret;
        }
        if let Ok(rate) = std::env::var("TAX_RATE") {
            if let Ok(rate) = rate.parse() {
                config.billing.tax_rate = rate;
            }
        }

        Ok(config)
    }

    /// Merge service configurations (other takes precedence)
    pub fn merge(mut self, other: Self) -> Self {
        self.server = self.server.merge(other.server);
        self.storage = self.storage.merge(other.storage);
        self.billing = self.billing.merge(other.billing);
        self.limits = self.limits.merge(other.limits);
        self.external = self.external.merge(other.external);
        self
    }
}

pub(crate) fn default_max_connections() -> u32 {
    20
}

pub(crate) fn default_redis_max_connections() -> u32 {
    10
}

pub(crate) fn default_connection_timeout() -> u64 {
    5
}

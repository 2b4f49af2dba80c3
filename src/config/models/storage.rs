//! Storage configuration

use super::{default_connection_timeout, default_max_connections, default_redis_max_connections};
use serde::{Deserialize, Serialize};

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// System-of-record database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Fast-path cache configuration
    #[serde(default)]
    pub redis: RedisConfig,
}

impl StorageConfig {
    /// Merge storage configurations
    pub fn merge(mut self, other: Self) -> Self {
        self.database = self.database.merge(other.database);
        self.redis = self.redis.merge(other.redis);
        self
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Maximum connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Connection timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u64,
    /// Per-statement timeout in seconds
    #[serde(default = "default_statement_timeout")]
    pub statement_timeout: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/metergate".to_string(),
            max_connections: default_max_connections(),
            connection_timeout: default_connection_timeout(),
            statement_timeout: default_statement_timeout(),
        }
    }
}

impl DatabaseConfig {
    /// Merge database configurations
    pub fn merge(mut self, other: Self) -> Self {
        if !other.url.is_empty() && other.url != DatabaseConfig::default().url {
            self.url = other.url;
        }
        if other.max_connections != default_max_connections() {
            self.max_connections = other.max_connections;
        }
        if other.connection_timeout != default_connection_timeout() {
            self.connection_timeout = other.connection_timeout;
        }
        if other.statement_timeout != default_statement_timeout() {
            self.statement_timeout = other.statement_timeout;
        }
        self
    }
}

/// Fast-path cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Redis URL
    pub url: String,
    /// Enable the cache (when false, everything runs on store fallbacks)
    #[serde(default = "default_redis_enabled")]
    pub enabled: bool,
    /// Maximum connections
    #[serde(default = "default_redis_max_connections")]
    pub max_connections: u32,
    /// Per-operation timeout in milliseconds
    #[serde(default = "default_redis_op_timeout_ms")]
    pub op_timeout_ms: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            enabled: default_redis_enabled(),
            max_connections: default_redis_max_connections(),
            op_timeout_ms: default_redis_op_timeout_ms(),
        }
    }
}

impl RedisConfig {
    /// Merge Redis configurations
    pub fn merge(mut self, other: Self) -> Self {
        if !other.url.is_empty() && other.url != RedisConfig::default().url {
            self.url = other.url;
        }
        if !other.enabled {
            self.enabled = other.enabled;
        }
        if other.max_connections != default_redis_max_connections() {
            self.max_connections = other.max_connections;
        }
        if other.op_timeout_ms != default_redis_op_timeout_ms() {
            self.op_timeout_ms = other.op_timeout_ms;
        }
        self
    }
}

fn default_redis_enabled() -> bool {
    true
}

fn default_statement_timeout() -> u64 {
    5
}

fn default_redis_op_timeout_ms() -> u64 {
    100
}

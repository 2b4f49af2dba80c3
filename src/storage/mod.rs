//! Storage layer: system-of-record store plus fast-path cache
//!
//! The database is the source of truth for every invariant-bearing write.
//! The Redis cache only accelerates counters and lookups; each use goes
//! through [`StorageLayer::try_cache`], which enforces the breaker and the
//! per-operation timeout and degrades to `None` so the caller falls back to
//! the store.

/// Circuit breaker for the fast-path cache
pub mod breaker;
/// Database storage module
pub mod database;
/// Redis cache module
pub mod redis;

use crate::config::Config;
use crate::utils::error::Result;
use breaker::CacheBreaker;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Main storage layer orchestrating the store and the cache
#[derive(Clone)]
pub struct StorageLayer {
    /// Database connection pool
    pub database: Arc<database::Database>,
    /// Redis connection pool
    pub redis: Arc<redis::RedisPool>,
    /// Process-wide cache circuit breaker
    pub breaker: Arc<CacheBreaker>,
    cache_op_timeout: Duration,
}

impl StorageLayer {
    /// Create a new storage layer
    pub async fn new(config: &Config) -> Result<Self> {
        info!("Initializing storage layer");

        debug!("Connecting to database");
        let database = Arc::new(database::Database::new(&config.storage().database).await?);

        let redis = if config.storage().redis.enabled {
            debug!("Connecting to Redis");
            match redis::RedisPool::new(&config.storage().redis).await {
                Ok(pool) => Arc::new(pool),
                Err(e) => {
                    warn!("Redis connection failed, continuing on store fallbacks: {}", e);
                    Arc::new(redis::RedisPool::create_noop())
                }
            }
        } else {
            debug!("Redis disabled, running on store fallbacks");
            Arc::new(redis::RedisPool::create_noop())
        };

        let breaker = Arc::new(CacheBreaker::new(
            config.limits().breaker_threshold,
            Duration::from_secs(config.limits().breaker_cooldown_secs),
        ));

        info!("Storage layer initialized successfully");

        Ok(Self {
            database,
            redis,
            breaker,
            cache_op_timeout: Duration::from_millis(config.storage().redis.op_timeout_ms),
        })
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        self.database.migrate().await
    }

    /// Get the database
    pub fn db(&self) -> &database::Database {
        &self.database
    }

    /// Get the Redis pool
    pub fn cache(&self) -> &redis::RedisPool {
        &self.redis
    }

    /// Attempt a cache operation, degrading to `None` on any failure
    ///
    /// This is the single path through which business logic touches the
    /// cache. `None` means "use the store fallback": the breaker is open, the
    /// pool is in no-op mode, the operation errored, or it exceeded the cache
    /// operation timeout. Failures feed the breaker; the caller never sees a
    /// cache error.
    pub async fn try_cache<T, F>(&self, op: &str, fut: F) -> Option<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.redis.is_noop() || !self.breaker.allow() {
            return None;
        }

        match tokio::time::timeout(self.cache_op_timeout, fut).await {
            Ok(Ok(value)) => {
                self.breaker.record_success();
                Some(value)
            }
            Ok(Err(e)) => {
                warn!("Cache operation {} failed: {}", op, e);
                self.breaker.record_failure();
                None
            }
            Err(_) => {
                warn!("Cache operation {} timed out", op);
                self.breaker.record_failure();
                None
            }
        }
    }

    /// Health check for both backends
    pub async fn health_check(&self) -> StorageHealthStatus {
        let mut status = StorageHealthStatus {
            database: false,
            cache: false,
            overall: false,
        };

        match self.database.health_check().await {
            Ok(_) => status.database = true,
            Err(e) => warn!("Database health check failed: {}", e),
        }

        match self.redis.health_check().await {
            Ok(_) => status.cache = true,
            Err(e) => warn!("Redis health check failed: {}", e),
        }

        // The cache is an accelerator; only the store is load-bearing.
        status.overall = status.database;
        status
    }
}

/// Storage health status
#[derive(Debug, Clone, serde::Serialize)]
pub struct StorageHealthStatus {
    /// Database health
    pub database: bool,
    /// Cache health
    pub cache: bool,
    /// Overall health
    pub overall: bool,
}

//! Redis connection pool and core connection management

use crate::config::RedisConfig;
use crate::utils::error::{MeterError, Result};
use redis::{aio::MultiplexedConnection, Client};
use tracing::{debug, info};

/// Redis connection pool (supports no-op mode when the cache is disabled)
#[derive(Debug, Clone)]
pub struct RedisPool {
    /// Redis client (None in no-op mode)
    pub(crate) client: Option<Client>,
    /// Connection manager (None in no-op mode)
    pub(crate) connection_manager: Option<MultiplexedConnection>,
    /// Whether this is a no-op pool (cache disabled or unavailable)
    pub(crate) noop_mode: bool,
}

/// Redis connection wrapper
pub struct RedisConnection {
    pub(crate) conn: Option<MultiplexedConnection>,
}

impl RedisPool {
    /// Create a new Redis pool
    pub async fn new(config: &RedisConfig) -> Result<Self> {
        info!("Creating Redis connection pool");
        debug!("Redis URL: {}", Self::sanitize_url(&config.url));

        let client = Client::open(config.url.as_str()).map_err(MeterError::Redis)?;

        let connection_manager = client
            .get_multiplexed_async_connection()
            .await
            .map_err(MeterError::Redis)?;

        info!("Redis connection pool created successfully");
        Ok(Self {
            client: Some(client),
            connection_manager: Some(connection_manager),
            noop_mode: false,
        })
    }

    /// Create a no-op Redis pool for degraded operation
    pub fn create_noop() -> Self {
        info!("Creating no-op Redis pool (cache disabled)");
        Self {
            client: None,
            connection_manager: None,
            noop_mode: true,
        }
    }

    /// Check if this is a no-op pool
    pub fn is_noop(&self) -> bool {
        self.noop_mode
    }

    /// Get a connection from the pool
    pub async fn get_connection(&self) -> Result<RedisConnection> {
        Ok(RedisConnection {
            conn: self.connection_manager.clone(),
        })
    }

    /// Health check
    pub async fn health_check(&self) -> Result<()> {
        if self.noop_mode {
            debug!("Redis health check skipped (no-op mode)");
            return Ok(());
        }

        let mut conn = self.get_connection().await?;
        if let Some(ref mut c) = conn.conn {
            let _: String = redis::cmd("PING")
                .query_async(c)
                .await
                .map_err(MeterError::Redis)?;
        }

        Ok(())
    }

    /// Sanitize a Redis URL for logging (hide password)
    pub(crate) fn sanitize_url(url: &str) -> String {
        if let Ok(parsed) = url::Url::parse(url) {
            let mut sanitized = parsed.clone();
            if sanitized.password().is_some() {
                let _ = sanitized.set_password(Some("***"));
            }
            sanitized.to_string()
        } else {
            "invalid_url".to_string()
        }
    }
}

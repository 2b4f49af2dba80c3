//! Redis atomic counter operations

use super::pool::RedisPool;
use crate::utils::error::{MeterError, Result};
use redis::AsyncCommands;

impl RedisPool {
    /// Create a counter with an initial value and TTL only if it does not
    /// already exist, returning whether this call created it
    pub async fn set_nx_with_ttl(&self, key: &str, value: i64, ttl: u64) -> Result<bool> {
        if self.noop_mode {
            return Ok(false);
        }

        let mut conn = self.get_connection().await?;
        if let Some(ref mut c) = conn.conn {
            let created: Option<String> = redis::cmd("SET")
                .arg(key)
                .arg(value)
                .arg("NX")
                .arg("EX")
                .arg(ttl)
                .query_async(c)
                .await
                .map_err(MeterError::Redis)?;
            Ok(created.is_some())
        } else {
            Ok(false)
        }
    }

    /// Decrement a key by delta, returning the new value
    pub async fn decr_by(&self, key: &str, delta: i64) -> Result<i64> {
        if self.noop_mode {
            return Ok(-delta);
        }

        let mut conn = self.get_connection().await?;
        if let Some(ref mut c) = conn.conn {
            let new_value: i64 = c.decr(key, delta).await.map_err(MeterError::Redis)?;
            Ok(new_value)
        } else {
            Ok(-delta)
        }
    }

    /// Increment a key by delta and set its TTL in one atomic pipeline,
    /// returning the new value
    pub async fn incr_by_with_ttl(&self, key: &str, delta: i64, ttl: u64) -> Result<i64> {
        if self.noop_mode {
            return Ok(delta);
        }

        let mut conn = self.get_connection().await?;
        if let Some(ref mut c) = conn.conn {
            let mut pipe = redis::pipe();
            pipe.atomic();
            pipe.incr(key, delta);
            pipe.expire(key, ttl as i64).ignore();

            let (new_value,): (i64,) = pipe.query_async(c).await.map_err(MeterError::Redis)?;
            Ok(new_value)
        } else {
            Ok(delta)
        }
    }
}

//! Batch Redis operations

use super::pool::RedisPool;
use crate::utils::error::{MeterError, Result};
use redis::AsyncCommands;

impl RedisPool {
    /// Get multiple keys at once
    pub async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>> {
        if self.noop_mode || keys.is_empty() {
            return Ok(vec![None; keys.len()]);
        }

        let mut conn = self.get_connection().await?;
        if let Some(ref mut c) = conn.conn {
            let values: Vec<Option<String>> = c.mget(keys).await.map_err(MeterError::Redis)?;
            Ok(values)
        } else {
            Ok(vec![None; keys.len()])
        }
    }

    /// Set multiple key-value pairs with optional TTL
    pub async fn mset(&self, pairs: &[(String, String)], ttl: Option<u64>) -> Result<()> {
        if self.noop_mode || pairs.is_empty() {
            return Ok(());
        }

        let mut conn = self.get_connection().await?;
        if let Some(ref mut c) = conn.conn {
            let mut pipe = redis::pipe();
            pipe.atomic();

            for (key, value) in pairs {
                if let Some(ttl_seconds) = ttl {
                    pipe.set_ex(key, value, ttl_seconds);
                } else {
                    pipe.set(key, value);
                }
            }

            let _: () = pipe.query_async(c).await.map_err(MeterError::Redis)?;
        }
        Ok(())
    }

    /// Increment many counters in one pipeline, each with its own TTL
    ///
    /// Used by the admission controller to bump all sliding-window buckets in
    /// a single round-trip once every limit has passed its read-only check.
    pub async fn incr_many_with_ttl(&self, entries: &[(String, i64, u64)]) -> Result<Vec<i64>> {
        if self.noop_mode || entries.is_empty() {
            return Ok(entries.iter().map(|(_, delta, _)| *delta).collect());
        }

        let mut conn = self.get_connection().await?;
        if let Some(ref mut c) = conn.conn {
            let mut pipe = redis::pipe();
            pipe.atomic();

            for (key, delta, ttl) in entries {
                pipe.incr(key, *delta);
                pipe.expire(key, *ttl as i64).ignore();
            }

            let values: Vec<i64> = pipe.query_async(c).await.map_err(MeterError::Redis)?;
            Ok(values)
        } else {
            Ok(entries.iter().map(|(_, delta, _)| *delta).collect())
        }
    }
}

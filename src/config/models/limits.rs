//! Cache TTL, circuit-breaker, and ingest tuning

use serde::{Deserialize, Serialize};

/// Cache TTLs, circuit-breaker, and ingest tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Idempotency cache TTL in seconds (≥ 24 h)
    #[serde(default = "default_idempotency_ttl")]
    pub idempotency_ttl_secs: u64,
    /// Consecutive cache failures before the breaker opens
    #[serde(default = "default_breaker_threshold")]
    pub breaker_threshold: u32,
    /// Seconds the breaker stays open before retrying the cache
    #[serde(default = "default_breaker_cooldown")]
    pub breaker_cooldown_secs: u64,
    /// Maximum events accepted in one batch
    #[serde(default = "default_max_batch")]
    pub max_batch_size: usize,
    /// In-flight cap for fanned-out cache writes inside one request
    #[serde(default = "default_ingest_concurrency")]
    pub ingest_concurrency: usize,
    /// Accepted clock skew for future-dated event timestamps, in hours
    #[serde(default = "default_future_skew")]
    pub future_skew_hours: i64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            idempotency_ttl_secs: default_idempotency_ttl(),
            breaker_threshold: default_breaker_threshold(),
            breaker_cooldown_secs: default_breaker_cooldown(),
            max_batch_size: default_max_batch(),
            ingest_concurrency: default_ingest_concurrency(),
            future_skew_hours: default_future_skew(),
        }
    }
}

impl LimitsConfig {
    /// Validate limits configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.idempotency_ttl_secs < 86_400 {
            return Err("idempotency_ttl_secs must be at least 24 hours".to_string());
        }
        if self.breaker_threshold == 0 {
            return Err("breaker_threshold must be non-zero".to_string());
        }
        if self.max_batch_size == 0 || self.max_batch_size > 1000 {
            return Err("max_batch_size must be in 1..=1000".to_string());
        }
        if self.ingest_concurrency == 0 {
            return Err("ingest_concurrency must be non-zero".to_string());
        }
        Ok(())
    }

    /// Merge limits configurations
    pub fn merge(mut self, other: Self) -> Self {
        if other.idempotency_ttl_secs != default_idempotency_ttl() {
            self.idempotency_ttl_secs = other.idempotency_ttl_secs;
        }
        if other.breaker_threshold != default_breaker_threshold() {
            self.breaker_threshold = other.breaker_threshold;
        }
        if other.breaker_cooldown_secs != default_breaker_cooldown() {
            self.breaker_cooldown_secs = other.breaker_cooldown_secs;
        }
        if other.max_batch_size != default_max_batch() {
            self.max_batch_size = other.max_batch_size;
        }
        if other.ingest_concurrency != default_ingest_concurrency() {
            self.ingest_concurrency = other.ingest_concurrency;
        }
        if other.future_skew_hours != default_future_skew() {
            self.future_skew_hours = other.future_skew_hours;
        }
        self
    }
}

fn default_idempotency_ttl() -> u64 {
    86_400
}

fn default_breaker_threshold() -> u32 {
    5
}

fn default_breaker_cooldown() -> u64 {
    30
}

fn default_max_batch() -> usize {
    1000
}

fn default_ingest_concurrency() -> usize {
    64
}

fn default_future_skew() -> i64 {
    24
}

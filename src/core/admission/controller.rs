//! Admission controller implementation

use super::types::{AdmissionDecision, Granularity, PolicySnapshot};
use crate::storage::StorageLayer;
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

/// Per-organization rate limiter over cache-resident sliding-window buckets
#[derive(Clone)]
pub struct AdmissionController {
    storage: Arc<StorageLayer>,
}

impl AdmissionController {
    /// Create a new admission controller
    pub fn new(storage: Arc<StorageLayer>) -> Self {
        Self { storage }
    }

    /// Check and record one request for an identifier under a policy
    ///
    /// Reads all bucket counts first; a rejected request never increments.
    /// When every limit passes, all buckets are bumped in one pipelined
    /// round-trip.
    pub async fn admit(
        &self,
        identifier: &str,
        policy: &PolicySnapshot,
        now: DateTime<Utc>,
    ) -> Result<AdmissionDecision> {
        let limits = policy.limits();
        if limits.is_empty() {
            return Ok(AdmissionDecision::unlimited(now));
        }

        let keys: Vec<String> = limits
            .iter()
            .map(|(granularity, _)| bucket_key(identifier, *granularity, now))
            .collect();

        let counts = match self
            .storage
            .try_cache("ratelimit.read", self.storage.cache().mget(&keys))
            .await
        {
            Some(counts) => counts,
            None => {
                // Rate limiting fails open on cache loss; quota and
                // idempotency still hold the line via the store.
                debug!("Rate-limit cache unavailable, admitting {}", identifier);
                return Ok(AdmissionDecision::unlimited(now));
            }
        };

        let mut most_restrictive: Option<AdmissionDecision> = None;
        for ((granularity, limit), count) in limits.iter().zip(counts.iter()) {
            let current: u64 = count
                .as_deref()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0);
            let reset_at = granularity.next_window(now);

            if current >= *limit {
                let retry_after = (reset_at - now).num_seconds().max(1) as u64;
                debug!(
                    "Rate limit exceeded for {} at {}: {}/{}",
                    identifier,
                    granularity.label(),
                    current,
                    limit
                );
                return Ok(AdmissionDecision {
                    allowed: false,
                    limit: *limit,
                    remaining: 0,
                    reset_at,
                    retry_after_secs: Some(retry_after),
                });
            }

            let remaining = limit - current - 1;
            let candidate = AdmissionDecision {
                allowed: true,
                limit: *limit,
                remaining,
                reset_at,
                retry_after_secs: None,
            };
            match &most_restrictive {
                Some(best) if best.remaining <= remaining => {}
                _ => most_restrictive = Some(candidate),
            }
        }

        // All limits passed: bump every bucket pipelined, best-effort.
        let entries: Vec<(String, i64, u64)> = limits
            .iter()
            .zip(keys.iter())
            .map(|((granularity, _), key)| (key.clone(), 1, granularity.bucket_ttl()))
            .collect();
        self.storage
            .try_cache(
                "ratelimit.incr",
                self.storage.cache().incr_many_with_ttl(&entries),
            )
            .await;

        Ok(most_restrictive.unwrap_or_else(|| AdmissionDecision::unlimited(now)))
    }
}

/// Bucket key for an identifier at a granularity
pub(super) fn bucket_key(identifier: &str, granularity: Granularity, now: DateTime<Utc>) -> String {
    format!(
        "ratelimit:{}:{}:{}",
        identifier,
        granularity.label(),
        granularity.window_start(now)
    )
}

//! Idempotency filter implementation

use crate::storage::StorageLayer;
use crate::utils::error::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Two-tier duplicate detection: fast-path cache first, store fallback for
/// anything uncached
///
/// The filter is advisory. The unique `(organization_id, idempotency_key)`
/// constraint in the store is the ultimate guarantor; any race that slips
/// past here is caught at insert time and converted to a duplicate outcome.
#[derive(Clone)]
pub struct IdempotencyFilter {
    storage: Arc<StorageLayer>,
    cache_ttl_secs: u64,
}

impl IdempotencyFilter {
    /// Create a new filter
    pub fn new(storage: Arc<StorageLayer>, cache_ttl_secs: u64) -> Self {
        Self {
            storage,
            cache_ttl_secs,
        }
    }

    /// Classify idempotency keys, returning the existing event id for every
    /// key already accepted. Events without a key are never duplicates.
    pub async fn classify(
        &self,
        organization_id: Uuid,
        keys: &[String],
    ) -> Result<HashMap<String, Uuid>> {
        if keys.is_empty() {
            return Ok(HashMap::new());
        }

        let cache_keys: Vec<String> = keys
            .iter()
            .map(|key| cache_key(organization_id, key))
            .collect();

        let mut known: HashMap<String, Uuid> = HashMap::new();
        let mut uncached: Vec<String> = Vec::new();

        match self
            .storage
            .try_cache("idempotency.mget", self.storage.cache().mget(&cache_keys))
            .await
        {
            Some(values) => {
                for (key, value) in keys.iter().zip(values.iter()) {
                    match value.as_deref().and_then(|v| Uuid::parse_str(v).ok()) {
                        Some(event_id) => {
                            known.insert(key.clone(), event_id);
                        }
                        None => uncached.push(key.clone()),
                    }
                }
            }
            None => uncached = keys.to_vec(),
        }

        if uncached.is_empty() {
            return Ok(known);
        }

        let stored = self
            .storage
            .db()
            .find_events_by_idempotency_keys(organization_id, &uncached)
            .await?;

        let mut warmup: Vec<(String, String)> = Vec::new();
        for event in stored {
            if let Some(key) = event.idempotency_key {
                warmup.push((cache_key(organization_id, &key), event.id.to_string()));
                known.insert(key, event.id);
            }
        }

        // Best-effort warm-up for keys found only in the store.
        if !warmup.is_empty() {
            debug!("Warming idempotency cache with {} entries", warmup.len());
            self.storage
                .try_cache(
                    "idempotency.warmup",
                    self.storage.cache().mset(&warmup, Some(self.cache_ttl_secs)),
                )
                .await;
        }

        Ok(known)
    }

    /// Record accepted events in the cache (C6 step 8)
    pub async fn record(&self, organization_id: Uuid, entries: &[(String, Uuid)]) {
        if entries.is_empty() {
            return;
        }

        let pairs: Vec<(String, String)> = entries
            .iter()
            .map(|(key, event_id)| (cache_key(organization_id, key), event_id.to_string()))
            .collect();

        self.storage
            .try_cache(
                "idempotency.record",
                self.storage.cache().mset(&pairs, Some(self.cache_ttl_secs)),
            )
            .await;
    }
}

/// Cache key for an idempotency entry
pub(super) fn cache_key(organization_id: Uuid, idempotency_key: &str) -> String {
    format!("idempotency:{}:{}", organization_id, idempotency_key)
}

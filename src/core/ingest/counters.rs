//! Rolling usage counters at hourly and daily granularity
//!
//! Updated after the request commits, fire-and-forget: failures are logged
//! and never fail the request. The contract is eventual reflection of all
//! committed events.

use super::recorder::{fresh_quantities, EventDisposition};
use super::types::ParsedEvent;
use crate::storage::StorageLayer;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;

const HOUR_TTL_SECS: u64 = 48 * 3600;
const DAY_TTL_SECS: u64 = 40 * 24 * 3600;
const MICROS_PER_UNIT: i64 = 1_000_000;

/// One counter bump: key, micro-unit delta, TTL
pub(super) type CounterEntry = (String, i64, u64);

/// Aggregate a batch's fresh events into counter bumps, one per
/// `(tenant, event type, window)`
pub(super) fn aggregate(
    events: &[ParsedEvent],
    dispositions: &[EventDisposition],
    now: DateTime<Utc>,
) -> Vec<CounterEntry> {
    let hour = now.format("%Y%m%d%H").to_string();
    let day = now.format("%Y%m%d").to_string();

    let mut sums: HashMap<String, (i64, u64)> = HashMap::new();
    for fresh in fresh_quantities(events, dispositions) {
        let micros = to_micros(fresh.quantity);
        let hour_key = format!(
            "usage:{}:{}:hour:{}",
            fresh.tenant_id, fresh.event_type, hour
        );
        let day_key = format!("usage:{}:{}:day:{}", fresh.tenant_id, fresh.event_type, day);

        sums.entry(hour_key)
            .and_modify(|(total, _)| *total += micros)
            .or_insert((micros, HOUR_TTL_SECS));
        sums.entry(day_key)
            .and_modify(|(total, _)| *total += micros)
            .or_insert((micros, DAY_TTL_SECS));
    }

    sums.into_iter()
        .map(|(key, (micros, ttl))| (key, micros, ttl))
        .collect()
}

/// Spawn the counter update with a bounded in-flight cap
pub(super) fn spawn_update(
    storage: Arc<StorageLayer>,
    entries: Vec<CounterEntry>,
    concurrency: usize,
) {
    if entries.is_empty() {
        return;
    }

    tokio::spawn(async move {
        stream::iter(entries)
            .for_each_concurrent(concurrency, |(key, micros, ttl)| {
                let storage = storage.clone();
                async move {
                    storage
                        .try_cache(
                            "usage.counter",
                            storage.cache().incr_by_with_ttl(&key, micros, ttl),
                        )
                        .await;
                }
            })
            .await;
    });
}

fn to_micros(quantity: Decimal) -> i64 {
    (quantity * Decimal::from(MICROS_PER_UNIT))
        .round()
        .try_into()
        .unwrap_or(i64::MAX)
}

//! Quota engine implementation

use super::types::{counter_key, decide, from_micros, to_micros, QuotaCharge, QuotaDecision};
use crate::storage::StorageLayer;
use crate::utils::error::{MeterError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, warn};

/// Counters outlive a monthly period comfortably; stale periods expire on
/// their own.
const COUNTER_TTL_SECS: u64 = 40 * 24 * 3600;

/// A reservation held in the cache, kept for compensation on reject
struct Reservation {
    key: String,
    micros: i64,
}

/// Per-`(tenant, event type)` quota enforcement
#[derive(Clone)]
pub struct QuotaEngine {
    storage: Arc<StorageLayer>,
}

impl QuotaEngine {
    /// Create a new quota engine
    pub fn new(storage: Arc<StorageLayer>) -> Self {
        Self { storage }
    }

    /// Check and reserve a single pre-summed charge
    pub async fn check_and_reserve(
        &self,
        charge: &QuotaCharge,
        now: DateTime<Utc>,
    ) -> Result<QuotaDecision> {
        let (decision, reservation) = self.reserve(charge, now).await?;

        if !decision.allowed {
            self.release(reservation).await;
            return Err(MeterError::QuotaExceeded {
                violations: vec![decision.violation(charge)],
            });
        }

        Ok(decision)
    }

    /// Check and reserve a batch of pre-summed charges, all-or-nothing
    ///
    /// Quantities must already be summed per `(tenant, event type)`. On any
    /// violation the whole batch is rejected and every reservation taken so
    /// far is compensated, so a rejected request consumes no quota.
    pub async fn check_and_reserve_batch(
        &self,
        charges: &[QuotaCharge],
        now: DateTime<Utc>,
    ) -> Result<Vec<QuotaDecision>> {
        let mut decisions = Vec::with_capacity(charges.len());
        let mut reservations = Vec::new();
        let mut violations = Vec::new();

        for charge in charges {
            let (decision, reservation) = self.reserve(charge, now).await?;
            if !decision.allowed {
                violations.push(decision.violation(charge));
            }
            if let Some(reservation) = reservation {
                reservations.push(reservation);
            }
            decisions.push(decision);
        }

        if !violations.is_empty() {
            for reservation in reservations {
                self.release(Some(reservation)).await;
            }
            return Err(MeterError::QuotaExceeded { violations });
        }

        Ok(decisions)
    }

    /// Compensate reservations for events that later turn out to be
    /// duplicates (discovered at insert time)
    pub async fn release_quantity(&self, tenant_id: uuid::Uuid, event_type: &str, quantity: Decimal) {
        let Ok(Some(quota)) = self
            .storage
            .db()
            .find_quota_limit(tenant_id, event_type)
            .await
        else {
            return;
        };
        let key = counter_key(tenant_id, event_type, quota.reset_at);
        self.release(Some(Reservation {
            key,
            micros: to_micros(quantity),
        }))
        .await;
    }

    /// Reserve one charge: atomic cache increment with store fallback
    async fn reserve(
        &self,
        charge: &QuotaCharge,
        now: DateTime<Utc>,
    ) -> Result<(QuotaDecision, Option<Reservation>)> {
        let quota = self
            .storage
            .db()
            .find_quota_limit(charge.tenant_id, &charge.event_type)
            .await?;

        let Some(quota) = quota else {
            // Absence means unlimited; nothing to account.
            return Ok((QuotaDecision::unlimited(Decimal::ZERO, charge.quantity), None));
        };

        let key = counter_key(charge.tenant_id, &charge.event_type, quota.reset_at);
        let micros = to_micros(charge.quantity);

        // The counter is never incremented into existence: a fresh period key
        // is created with SET NX already carrying the store's total, and only
        // then incremented. A concurrent reserve therefore either finds no
        // key (and runs the same seed protocol) or finds a fully seeded
        // counter; no interleaving can observe a count missing prior usage.
        let exists = self
            .storage
            .try_cache("quota.exists", self.storage.cache().exists(&key))
            .await;

        let projected_micros = match exists {
            Some(true) => {
                self.storage
                    .try_cache(
                        "quota.reserve",
                        self.storage
                            .cache()
                            .incr_by_with_ttl(&key, micros, COUNTER_TTL_SECS),
                    )
                    .await
            }
            Some(false) => {
                let stored = self
                    .storage
                    .db()
                    .sum_quantity_since(charge.tenant_id, &charge.event_type, quota.reset_at)
                    .await?;
                debug!("Seeding quota counter {} with {} from store", key, stored);
                let seeded = self
                    .storage
                    .try_cache(
                        "quota.seed",
                        self.storage.cache().set_nx_with_ttl(
                            &key,
                            to_micros(stored),
                            COUNTER_TTL_SECS,
                        ),
                    )
                    .await;
                match seeded {
                    // Whether this call created the counter or a concurrent
                    // writer won the SET NX, the base is in place before the
                    // increment.
                    Some(_) => {
                        self.storage
                            .try_cache(
                                "quota.reserve",
                                self.storage
                                    .cache()
                                    .incr_by_with_ttl(&key, micros, COUNTER_TTL_SECS),
                            )
                            .await
                    }
                    None => None,
                }
            }
            None => None,
        };

        let (current, reservation) = match projected_micros {
            Some(projected) => (
                from_micros(projected - micros),
                Some(Reservation { key, micros }),
            ),
            None => {
                // Cache unavailable: the store is authoritative for the
                // current total, and there is nothing to compensate later.
                let stored = self
                    .storage
                    .db()
                    .sum_quantity_since(charge.tenant_id, &charge.event_type, quota.reset_at)
                    .await?;
                (stored, None)
            }
        };

        let decision = decide(&quota, current, charge.quantity, now);

        if decision.warning {
            warn!(
                "Tenant {} approaching quota for {}: {} of {}",
                charge.tenant_external_id,
                charge.event_type,
                decision.projected,
                quota.limit_value
            );
        }

        Ok((decision, reservation))
    }

    /// Compensate a reservation after a rejection
    async fn release(&self, reservation: Option<Reservation>) {
        let Some(reservation) = reservation else {
            return;
        };
        self.storage
            .try_cache(
                "quota.release",
                self.storage
                    .cache()
                    .decr_by(&reservation.key, reservation.micros),
            )
            .await;
    }
}

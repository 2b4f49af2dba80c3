//! Event recorder: durable persistence of accepted events

use super::counters;
use super::types::{IngestOutcome, ParsedEvent};
use crate::core::idempotency::IdempotencyFilter;
use crate::core::quota::{QuotaCharge, QuotaEngine};
use crate::core::tenants::TenantResolver;
use crate::storage::database::entities::usage_event;
use crate::storage::StorageLayer;
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::Set;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Per-event bookkeeping while a batch moves through the pipeline
#[derive(Clone, Copy)]
pub(super) enum Disposition {
    /// Replay of an already-accepted event
    Duplicate { event_id: Uuid },
    /// New event scheduled for insertion
    Fresh { event_id: Uuid, tenant_id: Uuid },
}

/// The ingestion pipeline (C6): resolves tenants, filters duplicates,
/// reserves quota, persists, and fans out best-effort cache updates
#[derive(Clone)]
pub struct EventRecorder {
    storage: Arc<StorageLayer>,
    tenants: TenantResolver,
    idempotency: IdempotencyFilter,
    quota: QuotaEngine,
    counter_concurrency: usize,
}

impl EventRecorder {
    /// Create a new recorder
    pub fn new(
        storage: Arc<StorageLayer>,
        tenants: TenantResolver,
        idempotency: IdempotencyFilter,
        quota: QuotaEngine,
        counter_concurrency: usize,
    ) -> Self {
        Self {
            storage,
            tenants,
            idempotency,
            quota,
            counter_concurrency,
        }
    }

    /// Ingest a batch of validated events, all-or-nothing
    ///
    /// Returns one outcome per input, in input order. A batch that violates
    /// quota persists nothing and consumes nothing.
    pub async fn ingest(
        &self,
        organization_id: Uuid,
        events: Vec<ParsedEvent>,
        now: DateTime<Utc>,
    ) -> Result<Vec<IngestOutcome>> {
        // Resolve every tenant referenced by the batch in one round-trip.
        let external_ids: Vec<String> = events
            .iter()
            .map(|e| e.tenant_external_id.clone())
            .collect();
        let tenant_map = self.tenants.resolve(organization_id, &external_ids).await?;

        // Classify idempotency keys against cache + store.
        let keys: Vec<String> = events
            .iter()
            .filter_map(|e| e.idempotency_key.clone())
            .collect();
        let mut known = self.idempotency.classify(organization_id, &keys).await?;

        // Split the batch. A key repeated inside one batch duplicates the
        // first occurrence.
        let mut dispositions: Vec<Disposition> = Vec::with_capacity(events.len());
        let mut fresh_models: Vec<usage_event::ActiveModel> = Vec::new();
        let mut fresh_indexes: Vec<usize> = Vec::new();

        for (index, event) in events.iter().enumerate() {
            let tenant_id = tenant_map[&event.tenant_external_id];

            if let Some(key) = &event.idempotency_key {
                if let Some(existing) = known.get(key) {
                    dispositions.push(Disposition::Duplicate { event_id: *existing });
                    continue;
                }
            }

            let event_id = Uuid::new_v4();
            if let Some(key) = &event.idempotency_key {
                known.insert(key.clone(), event_id);
            }
            fresh_models.push(make_model(organization_id, tenant_id, event_id, event, now));
            fresh_indexes.push(index);
            dispositions.push(Disposition::Fresh { event_id, tenant_id });
        }

        // Reserve quota for the aggregated fresh quantities; violations
        // reject the entire batch before anything is written.
        let charges = sum_charges(&events, &dispositions);
        if !charges.is_empty() {
            self.quota.check_and_reserve_batch(&charges, now).await?;
        }

        // Persist. A unique violation means a racing request won between our
        // classify and insert; re-read the winners and retry the remainder.
        if !fresh_models.is_empty() {
            match self.storage.db().insert_events(fresh_models.clone()).await {
                Ok(()) => {}
                Err(e) if e.is_unique_violation() => {
                    debug!("Duplicate race on insert, re-reading winners");
                    self.recover_duplicates(
                        organization_id,
                        &events,
                        &mut dispositions,
                        &fresh_models,
                        &fresh_indexes,
                    )
                    .await?;
                }
                Err(e) => return Err(e),
            }
        }

        // Warm the idempotency cache for everything we just persisted.
        let cache_entries: Vec<(String, Uuid)> = events
            .iter()
            .zip(dispositions.iter())
            .filter_map(|(event, disposition)| match disposition {
                Disposition::Fresh { event_id, .. } => event
                    .idempotency_key
                    .clone()
                    .map(|key| (key, *event_id)),
                Disposition::Duplicate { .. } => None,
            })
            .collect();
        self.idempotency.record(organization_id, &cache_entries).await;

        // Rolling counters update after the request commits; callers never
        // wait for it.
        let counter_entries = counters::aggregate(&events, &dispositions, now);
        counters::spawn_update(
            self.storage.clone(),
            counter_entries,
            self.counter_concurrency,
        );

        let fresh_count = dispositions
            .iter()
            .filter(|d| matches!(d, Disposition::Fresh { .. }))
            .count();
        info!(
            "Ingested {} events for organization {} ({} deduplicated)",
            events.len(),
            organization_id,
            events.len() - fresh_count
        );

        Ok(events
            .into_iter()
            .zip(dispositions)
            .map(|(event, disposition)| {
                let (event_id, deduplicated) = match disposition {
                    Disposition::Duplicate { event_id } => (event_id, true),
                    Disposition::Fresh { event_id, .. } => (event_id, false),
                };
                IngestOutcome {
                    event_id,
                    deduplicated,
                    tenant_external_id: event.tenant_external_id,
                    event_type: event.event_type,
                    idempotency_key: event.idempotency_key,
                }
            })
            .collect())
    }

    /// Handle a unique-constraint race: re-read winning rows, convert our
    /// losers to duplicates, give back their reserved quota, and retry the
    /// insert once with the remaining fresh set
    async fn recover_duplicates(
        &self,
        organization_id: Uuid,
        events: &[ParsedEvent],
        dispositions: &mut [Disposition],
        fresh_models: &[usage_event::ActiveModel],
        fresh_indexes: &[usize],
    ) -> Result<()> {
        let keys: Vec<String> = fresh_indexes
            .iter()
            .filter_map(|&i| events[i].idempotency_key.clone())
            .collect();
        let winners: HashMap<String, Uuid> = self
            .storage
            .db()
            .find_events_by_idempotency_keys(organization_id, &keys)
            .await?
            .into_iter()
            .filter_map(|e| e.idempotency_key.map(|k| (k, e.id)))
            .collect();

        let mut remaining: Vec<usage_event::ActiveModel> = Vec::new();
        for (model, &index) in fresh_models.iter().zip(fresh_indexes.iter()) {
            let event = &events[index];
            let winner = event
                .idempotency_key
                .as_ref()
                .and_then(|key| winners.get(key));

            match winner {
                Some(&existing_id) => {
                    let Disposition::Fresh { tenant_id, .. } = dispositions[index] else {
                        continue;
                    };
                    dispositions[index] = Disposition::Duplicate {
                        event_id: existing_id,
                    };
                    // The racing winner accounted this quantity already.
                    self.quota
                        .release_quantity(tenant_id, &event.event_type, event.quantity)
                        .await;
                }
                None => remaining.push(model.clone()),
            }
        }

        if !remaining.is_empty() {
            if let Err(e) = self.storage.db().insert_events(remaining).await {
                warn!("Event insert retry failed: {}", e);
                return Err(e);
            }
        }

        Ok(())
    }
}

fn make_model(
    organization_id: Uuid,
    tenant_id: Uuid,
    event_id: Uuid,
    event: &ParsedEvent,
    now: DateTime<Utc>,
) -> usage_event::ActiveModel {
    usage_event::ActiveModel {
        id: Set(event_id),
        organization_id: Set(organization_id),
        tenant_id: Set(tenant_id),
        event_type: Set(event.event_type.clone()),
        quantity: Set(event.quantity),
        metadata: Set(event.metadata.clone()),
        timestamp: Set(event.timestamp),
        idempotency_key: Set(event.idempotency_key.clone()),
        invoice_id: Set(None),
        billed_at: Set(None),
        created_at: Set(now),
    }
}

/// Pre-sum fresh quantities per `(tenant, event type)` for the batch quota
/// check
pub(super) fn sum_charges(events: &[ParsedEvent], dispositions: &[Disposition]) -> Vec<QuotaCharge> {
    let mut sums: HashMap<(Uuid, String), QuotaCharge> = HashMap::new();

    for (event, disposition) in events.iter().zip(dispositions.iter()) {
        let Disposition::Fresh { tenant_id, .. } = disposition else {
            continue;
        };
        sums.entry((*tenant_id, event.event_type.clone()))
            .and_modify(|charge| charge.quantity += event.quantity)
            .or_insert_with(|| QuotaCharge {
                tenant_id: *tenant_id,
                tenant_external_id: event.tenant_external_id.clone(),
                event_type: event.event_type.clone(),
                quantity: event.quantity,
            });
    }

    let mut charges: Vec<QuotaCharge> = sums.into_values().collect();
    charges.sort_by(|a, b| {
        (a.tenant_id, &a.event_type).cmp(&(b.tenant_id, &b.event_type))
    });
    charges
}

/// Counter aggregation input shared with the counters module
pub(super) struct FreshQuantity {
    pub tenant_id: Uuid,
    pub event_type: String,
    pub quantity: Decimal,
}

pub(super) fn fresh_quantities(
    events: &[ParsedEvent],
    dispositions: &[Disposition],
) -> Vec<FreshQuantity> {
    events
        .iter()
        .zip(dispositions.iter())
        .filter_map(|(event, disposition)| match disposition {
            Disposition::Fresh { tenant_id, .. } => Some(FreshQuantity {
                tenant_id: *tenant_id,
                event_type: event.event_type.clone(),
                quantity: event.quantity,
            }),
            Disposition::Duplicate { .. } => None,
        })
        .collect()
}

pub(super) use Disposition as EventDisposition;

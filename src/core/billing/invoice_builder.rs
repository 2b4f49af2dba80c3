//! Invoice builder (C7)

use super::tiering::{average_unit_price, price_quantity, TierSpec};
use crate::config::BillingConfig;
use crate::storage::database::entities::invoice;
use crate::storage::database::ops::{InvoiceCommit, LineItemCommit, SnapshotUpsert};
use crate::storage::StorageLayer;
use crate::utils::error::{MeterError, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Builds a tenant's invoice for a billing period
#[derive(Clone)]
pub struct InvoiceBuilder {
    storage: Arc<StorageLayer>,
    config: BillingConfig,
}

impl InvoiceBuilder {
    /// Create a new invoice builder
    pub fn new(storage: Arc<StorageLayer>, config: BillingConfig) -> Self {
        Self { storage, config }
    }

    /// Build and commit an invoice for `[period_start, period_end)`
    ///
    /// Aggregates the period's usage (snapshots first, raw events where
    /// coverage is missing), applies the ordered tier curve per event type,
    /// and commits invoice + line items + event back-links in one
    /// transaction. Long builds are bounded by the configured timeout.
    pub async fn build_invoice(
        &self,
        tenant_id: Uuid,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
    ) -> Result<invoice::Model> {
        if period_end <= period_start {
            return Err(MeterError::validation(
                "period",
                "period_end must be after period_start",
            ));
        }

        let deadline = StdDuration::from_secs(self.config.build_timeout_secs);
        match tokio::time::timeout(
            deadline,
            self.build_inner(tenant_id, period_start, period_end),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(MeterError::internal("invoice build timed out")),
        }
    }

    async fn build_inner(
        &self,
        tenant_id: Uuid,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
    ) -> Result<invoice::Model> {
        let tenant = self
            .storage
            .db()
            .find_tenant(tenant_id)
            .await?
            .ok_or_else(|| MeterError::not_found(format!("tenant {}", tenant_id)))?;
        let organization = self
            .storage
            .db()
            .find_organization(tenant.organization_id)
            .await?
            .ok_or_else(|| {
                MeterError::internal(format!("organization missing for tenant {}", tenant_id))
            })?;

        let usage = self
            .aggregate_period_usage(tenant_id, period_start, period_end)
            .await?;

        let tiers_by_type = self
            .load_tiers(organization.id, period_start, period_end)
            .await?;

        let mut line_items = Vec::new();
        let mut subtotal: i64 = 0;
        for (event_type, quantity) in &usage {
            if *quantity <= Decimal::ZERO {
                continue;
            }

            let tiers = tiers_by_type.get(event_type);
            let priced = match tiers {
                Some(tiers) => price_quantity(*quantity, tiers),
                None => {
                    // No curve configured: the quantity still appears on the
                    // invoice (the back-link covers these events) at zero
                    // cost, keeping line items equal to billed sums.
                    warn!(
                        "No pricing tiers for {} in organization {}",
                        event_type, organization.id
                    );
                    super::tiering::PricedLine {
                        total: 0,
                        breakdown: Vec::new(),
                    }
                }
            };

            subtotal += priced.total;
            line_items.push(LineItemCommit {
                event_type: event_type.clone(),
                quantity: *quantity,
                unit_price: average_unit_price(priced.total, *quantity),
                total_price: priced.total,
                tier_breakdown: serde_json::to_value(&priced.breakdown)?,
            });
        }

        let tax = tax_on(subtotal, self.config.tax_rate);
        let total = subtotal + tax;
        let due_date = period_end + Duration::days(self.config.due_days);

        // The generated number races against concurrent builds; the unique
        // index arbitrates and we retry with a fresh sequence value.
        let mut last_err = None;
        for attempt in 0..self.config.invoice_number_retries {
            let count = self.storage.db().count_invoices(organization.id).await?;
            let invoice_number = format_invoice_number(&organization.slug, count + 1 + attempt as u64);

            let commit = InvoiceCommit {
                organization_id: organization.id,
                tenant_id,
                invoice_number: invoice_number.clone(),
                period_start,
                period_end,
                subtotal,
                tax,
                total,
                due_date,
                line_items: line_items.clone(),
            };

            match self.storage.db().commit_invoice(commit).await {
                Ok((invoice, backlinked)) => {
                    info!(
                        "Invoice {} committed for tenant {}: {} line items, {} events linked",
                        invoice.invoice_number,
                        tenant_id,
                        line_items.len(),
                        backlinked
                    );
                    return Ok(invoice);
                }
                Err(e) if e.is_unique_violation() => {
                    debug!("Invoice number {} collided, retrying", invoice_number);
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_err.unwrap_or_else(|| MeterError::internal("invoice number retries exhausted")))
    }

    /// Aggregate the period's billable usage per event type
    ///
    /// Snapshot rows accelerate the common case; days without coverage fall
    /// back to raw events. Once any event in the period is already billed,
    /// snapshots can no longer be trusted to equal the billable set, so the
    /// aggregation switches to unbilled raw events (a rebuild over the same
    /// period then yields an empty invoice).
    async fn aggregate_period_usage(
        &self,
        tenant_id: Uuid,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
    ) -> Result<BTreeMap<String, Decimal>> {
        let any_billed = self
            .storage
            .db()
            .any_billed_events_in_window(tenant_id, period_start, period_end)
            .await?;

        if any_billed {
            let sums = self
                .storage
                .db()
                .sum_unbilled_usage_by_event_type(tenant_id, period_start, period_end)
                .await?;
            return Ok(sums.into_iter().collect());
        }

        let first_day = period_start.date_naive();
        let last_day = (period_end - Duration::microseconds(1)).date_naive();

        let snapshots = self
            .storage
            .db()
            .find_snapshots_in_range(tenant_id, first_day, last_day)
            .await?;

        let mut totals: BTreeMap<String, Decimal> = BTreeMap::new();
        let mut covered: HashSet<NaiveDate> = HashSet::new();
        for snapshot in snapshots {
            covered.insert(snapshot.snapshot_date);
            *totals.entry(snapshot.event_type).or_default() += snapshot.total_quantity;
        }

        // Raw-event fallback for each contiguous run of uncovered days.
        for (run_start, run_end) in uncovered_runs(first_day, last_day, &covered) {
            let window_start = run_start
                .and_hms_opt(0, 0, 0)
                .map(|dt| dt.and_utc())
                .unwrap_or(period_start)
                .max(period_start);
            let window_end = run_end
                .succ_opt()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc())
                .unwrap_or(period_end)
                .min(period_end);

            let sums = self
                .storage
                .db()
                .sum_tenant_usage_by_event_type(tenant_id, window_start, window_end)
                .await?;
            for (event_type, quantity) in sums {
                *totals.entry(event_type).or_default() += quantity;
            }
        }

        Ok(totals)
    }

    async fn load_tiers(
        &self,
        organization_id: Uuid,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
    ) -> Result<HashMap<String, Vec<TierSpec>>> {
        let rows = self
            .storage
            .db()
            .find_effective_tiers(organization_id, period_start, period_end)
            .await?;

        let mut by_type: HashMap<String, Vec<TierSpec>> = HashMap::new();
        for row in &rows {
            by_type
                .entry(row.event_type.clone())
                .or_default()
                .push(TierSpec::from(row));
        }
        Ok(by_type)
    }
}

/// `INV-{SLUG}-{zero-padded sequence}`
pub(super) fn format_invoice_number(slug: &str, sequence: u64) -> String {
    format!("INV-{}-{:06}", slug.to_uppercase(), sequence)
}

/// Tax in cents on a cent subtotal
pub(super) fn tax_on(subtotal: i64, rate: f64) -> i64 {
    let rate = Decimal::try_from(rate).unwrap_or_default();
    (Decimal::from(subtotal) * rate)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .try_into()
        .unwrap_or(i64::MAX)
}

/// Contiguous runs of days in `[first, last]` with no snapshot coverage
pub(super) fn uncovered_runs(
    first: NaiveDate,
    last: NaiveDate,
    covered: &HashSet<NaiveDate>,
) -> Vec<(NaiveDate, NaiveDate)> {
    let mut runs = Vec::new();
    let mut run_start: Option<NaiveDate> = None;
    let mut day = first;

    while day <= last {
        if covered.contains(&day) {
            if let Some(start) = run_start.take() {
                runs.push((start, day.pred_opt().unwrap_or(start)));
            }
        } else if run_start.is_none() {
            run_start = Some(day);
        }

        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }

    if let Some(start) = run_start {
        runs.push((start, last));
    }

    runs
}

/// Daily snapshot row builder shared with the snapshot job
pub(super) fn snapshot_rows(
    tenant_id: Uuid,
    organization_id: Uuid,
    date: NaiveDate,
    sums: Vec<(String, Decimal)>,
) -> Vec<SnapshotUpsert> {
    sums.into_iter()
        .map(|(event_type, total_quantity)| SnapshotUpsert {
            tenant_id,
            organization_id,
            snapshot_date: date,
            event_type,
            total_quantity,
        })
        .collect()
}

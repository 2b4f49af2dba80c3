//! Daily snapshot job: roll up events into `(tenant, date, event type)` rows

use super::invoice_builder::snapshot_rows;
use crate::storage::StorageLayer;
use crate::utils::error::Result;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info};

const TENANT_BATCH: u64 = 50;

/// Builds daily usage snapshots, idempotently: replaying a date upserts the
/// same rows
#[derive(Clone)]
pub struct SnapshotJob {
    storage: Arc<StorageLayer>,
}

/// Outcome of one snapshot run
#[derive(Debug, Clone, serde::Serialize)]
pub struct SnapshotRunSummary {
    pub date: NaiveDate,
    pub tenants_processed: u64,
    pub snapshots_written: u64,
}

impl SnapshotJob {
    /// Create a new snapshot job
    pub fn new(storage: Arc<StorageLayer>) -> Self {
        Self { storage }
    }

    /// Build snapshots for one UTC day across all active tenants
    ///
    /// Tenants are walked in pages of 50; each tenant's events within
    /// `[00:00, 24:00)` UTC are summed per event type and upserted.
    pub async fn build_for_date(&self, date: NaiveDate) -> Result<SnapshotRunSummary> {
        let day_start = date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc())
            .ok_or_else(|| crate::utils::error::MeterError::validation("date", "invalid date"))?;
        let day_end = date
            .succ_opt()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
            .ok_or_else(|| crate::utils::error::MeterError::validation("date", "invalid date"))?;

        let mut tenants_processed = 0u64;
        let mut snapshots_written = 0u64;
        let mut page = 0u64;

        loop {
            let tenants = self
                .storage
                .db()
                .active_tenants_page(page, TENANT_BATCH)
                .await?;
            if tenants.is_empty() {
                break;
            }

            for tenant in &tenants {
                let sums = self
                    .storage
                    .db()
                    .sum_tenant_usage_by_event_type(tenant.id, day_start, day_end)
                    .await?;
                tenants_processed += 1;

                if sums.is_empty() {
                    continue;
                }

                let rows = snapshot_rows(tenant.id, tenant.organization_id, date, sums);
                snapshots_written += rows.len() as u64;
                self.storage.db().upsert_snapshots(rows).await?;
            }

            debug!("Snapshot page {} processed ({} tenants)", page, tenants.len());

            if (tenants.len() as u64) < TENANT_BATCH {
                break;
            }
            page += 1;
        }

        info!(
            "Snapshot run for {}: {} tenants, {} rows",
            date, tenants_processed, snapshots_written
        );

        Ok(SnapshotRunSummary {
            date,
            tenants_processed,
            snapshots_written,
        })
    }
}

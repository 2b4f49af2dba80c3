use crate::storage::database::entities::usage_snapshot;
use crate::storage::database::Database;
use crate::utils::error::Result;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

/// One snapshot row to upsert
#[derive(Debug, Clone)]
pub struct SnapshotUpsert {
    pub tenant_id: Uuid,
    pub organization_id: Uuid,
    pub snapshot_date: NaiveDate,
    pub event_type: String,
    pub total_quantity: Decimal,
}

impl Database {
    /// Upsert daily roll-ups; replaying the same day overwrites in place
    pub async fn upsert_snapshots(&self, rows: Vec<SnapshotUpsert>) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let now = Utc::now();
        let models: Vec<usage_snapshot::ActiveModel> = rows
            .into_iter()
            .map(|row| usage_snapshot::ActiveModel {
                id: Set(Uuid::new_v4()),
                tenant_id: Set(row.tenant_id),
                organization_id: Set(row.organization_id),
                snapshot_date: Set(row.snapshot_date),
                event_type: Set(row.event_type),
                total_quantity: Set(row.total_quantity),
                created_at: Set(now),
                updated_at: Set(now),
            })
            .collect();

        usage_snapshot::Entity::insert_many(models)
            .on_conflict(
                OnConflict::columns([
                    usage_snapshot::Column::TenantId,
                    usage_snapshot::Column::SnapshotDate,
                    usage_snapshot::Column::EventType,
                ])
                .update_columns([
                    usage_snapshot::Column::TotalQuantity,
                    usage_snapshot::Column::UpdatedAt,
                ])
                .to_owned(),
            )
            .exec_without_returning(self.conn())
            .await?;

        Ok(())
    }

    /// Load a tenant's snapshots intersecting a date range (inclusive)
    pub async fn find_snapshots_in_range(
        &self,
        tenant_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<usage_snapshot::Model>> {
        Ok(usage_snapshot::Entity::find()
            .filter(usage_snapshot::Column::TenantId.eq(tenant_id))
            .filter(usage_snapshot::Column::SnapshotDate.gte(from))
            .filter(usage_snapshot::Column::SnapshotDate.lte(to))
            .all(self.conn())
            .await?)
    }

    /// Org-wide snapshots intersecting a date range, for day-grouped reporting
    pub async fn find_org_snapshots_in_range(
        &self,
        organization_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<usage_snapshot::Model>> {
        Ok(usage_snapshot::Entity::find()
            .filter(usage_snapshot::Column::OrganizationId.eq(organization_id))
            .filter(usage_snapshot::Column::SnapshotDate.gte(from))
            .filter(usage_snapshot::Column::SnapshotDate.lte(to))
            .all(self.conn())
            .await?)
    }
}

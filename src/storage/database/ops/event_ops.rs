use crate::storage::database::entities::usage_event;
use crate::storage::database::Database;
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, EntityTrait, FromQueryResult, QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

/// Filters for event listing
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub tenant_id: Option<Uuid>,
    pub event_type: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub limit: u64,
}

/// One row of a grouped usage aggregate
#[derive(Debug, Clone, FromQueryResult, serde::Serialize)]
pub struct UsageGroupRow {
    pub group_key: String,
    pub total_quantity: Decimal,
    pub event_count: i64,
}

#[derive(FromQueryResult)]
struct SumRow {
    total: Option<Decimal>,
}

/// Failure classes worth one immediate retry before surfacing a 5xx
fn is_transient(err: &sea_orm::DbErr) -> bool {
    let msg = err.to_string().to_lowercase();
    msg.contains("connection reset")
        || msg.contains("connection closed")
        || msg.contains("deadlock")
        || msg.contains("timed out")
}

impl Database {
    /// Insert a batch of events in one statement
    ///
    /// Transient failures (reset connections, deadlocks) get one brief
    /// retry. A unique violation on `(organization_id, idempotency_key)`
    /// surfaces to the recorder, which re-reads the winning rows and reports
    /// duplicates.
    pub async fn insert_events(&self, models: Vec<usage_event::ActiveModel>) -> Result<()> {
        if models.is_empty() {
            return Ok(());
        }

        match usage_event::Entity::insert_many(models.clone())
            .exec_without_returning(self.conn())
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if is_transient(&e) => {
                tracing::warn!("Transient insert failure, retrying once: {}", e);
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                usage_event::Entity::insert_many(models)
                    .exec_without_returning(self.conn())
                    .await?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Find events by idempotency keys within an organization
    pub async fn find_events_by_idempotency_keys(
        &self,
        organization_id: Uuid,
        keys: &[String],
    ) -> Result<Vec<usage_event::Model>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        Ok(usage_event::Entity::find()
            .filter(usage_event::Column::OrganizationId.eq(organization_id))
            .filter(usage_event::Column::IdempotencyKey.is_in(keys.iter().cloned()))
            .all(self.conn())
            .await?)
    }

    /// List events for an organization, newest first
    pub async fn list_events(
        &self,
        organization_id: Uuid,
        filter: &EventFilter,
    ) -> Result<Vec<usage_event::Model>> {
        let mut query = usage_event::Entity::find()
            .filter(usage_event::Column::OrganizationId.eq(organization_id));

        if let Some(tenant_id) = filter.tenant_id {
            query = query.filter(usage_event::Column::TenantId.eq(tenant_id));
        }
        if let Some(ref event_type) = filter.event_type {
            query = query.filter(usage_event::Column::EventType.eq(event_type.clone()));
        }
        if let Some(start) = filter.start_date {
            query = query.filter(usage_event::Column::Timestamp.gte(start));
        }
        if let Some(end) = filter.end_date {
            query = query.filter(usage_event::Column::Timestamp.lte(end));
        }

        Ok(query
            .order_by_desc(usage_event::Column::Timestamp)
            .limit(filter.limit)
            .all(self.conn())
            .await?)
    }

    /// Sum billed quantity for a `(tenant, event type)` pair since a cutoff
    ///
    /// Store fallback for the quota counter when the cache is unavailable.
    pub async fn sum_quantity_since(
        &self,
        tenant_id: Uuid,
        event_type: &str,
        since: DateTime<Utc>,
    ) -> Result<Decimal> {
        let row = usage_event::Entity::find()
            .select_only()
            .column_as(Expr::col(usage_event::Column::Quantity).sum(), "total")
            .filter(usage_event::Column::TenantId.eq(tenant_id))
            .filter(usage_event::Column::EventType.eq(event_type))
            .filter(usage_event::Column::Timestamp.gte(since))
            .into_model::<SumRow>()
            .one(self.conn())
            .await?;

        Ok(row.and_then(|r| r.total).unwrap_or_default())
    }

    /// Aggregate usage grouped by event type
    pub async fn aggregate_usage_by_event_type(
        &self,
        organization_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<UsageGroupRow>> {
        Ok(usage_event::Entity::find()
            .select_only()
            .column_as(usage_event::Column::EventType, "group_key")
            .column_as(Expr::col(usage_event::Column::Quantity).sum(), "total_quantity")
            .column_as(Expr::col(usage_event::Column::Id).count(), "event_count")
            .filter(usage_event::Column::OrganizationId.eq(organization_id))
            .filter(usage_event::Column::Timestamp.gte(start))
            .filter(usage_event::Column::Timestamp.lte(end))
            .group_by(usage_event::Column::EventType)
            .into_model::<UsageGroupRow>()
            .all(self.conn())
            .await?)
    }

    /// Organization-wide quantity sum over a half-open window
    ///
    /// Raw-event fallback for day-grouped reporting on days that have no
    /// snapshot coverage yet.
    pub async fn sum_org_usage_in_window(
        &self,
        organization_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Decimal> {
        let row = usage_event::Entity::find()
            .select_only()
            .column_as(Expr::col(usage_event::Column::Quantity).sum(), "total")
            .filter(usage_event::Column::OrganizationId.eq(organization_id))
            .filter(usage_event::Column::Timestamp.gte(start))
            .filter(usage_event::Column::Timestamp.lt(end))
            .into_model::<SumRow>()
            .one(self.conn())
            .await?;

        Ok(row.and_then(|r| r.total).unwrap_or_default())
    }

    /// Aggregate usage grouped by tenant
    pub async fn aggregate_usage_by_tenant(
        &self,
        organization_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<(Uuid, Decimal, i64)>> {
        #[derive(FromQueryResult)]
        struct Row {
            tenant_id: Uuid,
            total_quantity: Option<Decimal>,
            event_count: i64,
        }

        let rows = usage_event::Entity::find()
            .select_only()
            .column(usage_event::Column::TenantId)
            .column_as(Expr::col(usage_event::Column::Quantity).sum(), "total_quantity")
            .column_as(Expr::col(usage_event::Column::Id).count(), "event_count")
            .filter(usage_event::Column::OrganizationId.eq(organization_id))
            .filter(usage_event::Column::Timestamp.gte(start))
            .filter(usage_event::Column::Timestamp.lte(end))
            .group_by(usage_event::Column::TenantId)
            .into_model::<Row>()
            .all(self.conn())
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| (r.tenant_id, r.total_quantity.unwrap_or_default(), r.event_count))
            .collect())
    }

    /// Per-event-type sums for one tenant within a half-open window
    ///
    /// Serves both the snapshot job (one UTC day at a time) and the invoice
    /// builder's raw-event fallback.
    pub async fn sum_tenant_usage_by_event_type(
        &self,
        tenant_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<(String, Decimal)>> {
        #[derive(FromQueryResult)]
        struct Row {
            event_type: String,
            total_quantity: Option<Decimal>,
        }

        let rows = usage_event::Entity::find()
            .select_only()
            .column(usage_event::Column::EventType)
            .column_as(Expr::col(usage_event::Column::Quantity).sum(), "total_quantity")
            .filter(usage_event::Column::TenantId.eq(tenant_id))
            .filter(usage_event::Column::Timestamp.gte(start))
            .filter(usage_event::Column::Timestamp.lt(end))
            .group_by(usage_event::Column::EventType)
            .into_model::<Row>()
            .all(self.conn())
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| (r.event_type, r.total_quantity.unwrap_or_default()))
            .collect())
    }

    /// Per-event-type sums of not-yet-billed events in a half-open window
    ///
    /// This is the ground truth for invoice line items: only events the
    /// commit will back-link may be billed.
    pub async fn sum_unbilled_usage_by_event_type(
        &self,
        tenant_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<(String, Decimal)>> {
        #[derive(FromQueryResult)]
        struct Row {
            event_type: String,
            total_quantity: Option<Decimal>,
        }

        let rows = usage_event::Entity::find()
            .select_only()
            .column(usage_event::Column::EventType)
            .column_as(Expr::col(usage_event::Column::Quantity).sum(), "total_quantity")
            .filter(usage_event::Column::TenantId.eq(tenant_id))
            .filter(usage_event::Column::Timestamp.gte(start))
            .filter(usage_event::Column::Timestamp.lt(end))
            .filter(usage_event::Column::InvoiceId.is_null())
            .group_by(usage_event::Column::EventType)
            .into_model::<Row>()
            .all(self.conn())
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| (r.event_type, r.total_quantity.unwrap_or_default()))
            .collect())
    }

    /// Whether any event in the window is already billed
    pub async fn any_billed_events_in_window(
        &self,
        tenant_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<bool> {
        use sea_orm::PaginatorTrait;

        let count = usage_event::Entity::find()
            .filter(usage_event::Column::TenantId.eq(tenant_id))
            .filter(usage_event::Column::Timestamp.gte(start))
            .filter(usage_event::Column::Timestamp.lt(end))
            .filter(usage_event::Column::InvoiceId.is_not_null())
            .count(self.conn())
            .await?;

        Ok(count > 0)
    }

    /// Sum billed quantity per event type for an invoice (audit queries)
    pub async fn sum_billed_quantity_by_event_type(
        &self,
        invoice_id: Uuid,
    ) -> Result<Vec<(String, Decimal)>> {
        #[derive(FromQueryResult)]
        struct Row {
            event_type: String,
            total_quantity: Option<Decimal>,
        }

        let rows = usage_event::Entity::find()
            .select_only()
            .column(usage_event::Column::EventType)
            .column_as(Expr::col(usage_event::Column::Quantity).sum(), "total_quantity")
            .filter(usage_event::Column::InvoiceId.eq(invoice_id))
            .group_by(usage_event::Column::EventType)
            .into_model::<Row>()
            .all(self.conn())
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| (r.event_type, r.total_quantity.unwrap_or_default()))
            .collect())
    }
}

use crate::storage::database::entities::quota_limit;
use crate::storage::database::Database;
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

impl Database {
    /// Find the quota limit for a `(tenant, event type)` pair
    pub async fn find_quota_limit(
        &self,
        tenant_id: Uuid,
        event_type: &str,
    ) -> Result<Option<quota_limit::Model>> {
        Ok(quota_limit::Entity::find()
            .filter(quota_limit::Column::TenantId.eq(tenant_id))
            .filter(quota_limit::Column::EventType.eq(event_type))
            .one(self.conn())
            .await?)
    }

    /// Batch-load quota limits for a set of pairs
    ///
    /// Over-fetches by the cross product and filters in memory; the sets
    /// involved are tiny (at most the distinct pairs of one ingest batch).
    pub async fn find_quota_limits_for_pairs(
        &self,
        pairs: &[(Uuid, String)],
    ) -> Result<Vec<quota_limit::Model>> {
        if pairs.is_empty() {
            return Ok(Vec::new());
        }

        let tenant_ids: Vec<Uuid> = pairs.iter().map(|(t, _)| *t).collect();
        let event_types: Vec<String> = pairs.iter().map(|(_, e)| e.clone()).collect();

        let rows = quota_limit::Entity::find()
            .filter(quota_limit::Column::TenantId.is_in(tenant_ids))
            .filter(quota_limit::Column::EventType.is_in(event_types))
            .all(self.conn())
            .await?;

        Ok(rows
            .into_iter()
            .filter(|row| {
                pairs
                    .iter()
                    .any(|(t, e)| *t == row.tenant_id && *e == row.event_type)
            })
            .collect())
    }

    /// Create or replace the quota limit for a `(tenant, event type)` pair
    #[allow(clippy::too_many_arguments)]
    pub async fn upsert_quota_limit(
        &self,
        tenant_id: Uuid,
        event_type: &str,
        limit_value: Decimal,
        soft_limit_value: Option<Decimal>,
        enforcement_mode: &str,
        overage_allowed: Option<Decimal>,
        grace_period_end: Option<DateTime<Utc>>,
        reset_at: DateTime<Utc>,
    ) -> Result<()> {
        let now = Utc::now();
        let model = quota_limit::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant_id),
            event_type: Set(event_type.to_string()),
            limit_value: Set(limit_value),
            soft_limit_value: Set(soft_limit_value),
            enforcement_mode: Set(enforcement_mode.to_string()),
            overage_allowed: Set(overage_allowed),
            grace_period_end: Set(grace_period_end),
            reset_at: Set(reset_at),
            created_at: Set(now),
            updated_at: Set(now),
        };

        quota_limit::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    quota_limit::Column::TenantId,
                    quota_limit::Column::EventType,
                ])
                .update_columns([
                    quota_limit::Column::LimitValue,
                    quota_limit::Column::SoftLimitValue,
                    quota_limit::Column::EnforcementMode,
                    quota_limit::Column::OverageAllowed,
                    quota_limit::Column::GracePeriodEnd,
                    quota_limit::Column::ResetAt,
                    quota_limit::Column::UpdatedAt,
                ])
                .to_owned(),
            )
            .exec_without_returning(self.conn())
            .await?;

        Ok(())
    }
}

use crate::storage::database::entities::pricing_tier;
use crate::storage::database::Database;
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

impl Database {
    /// Load an organization's pricing tiers whose effectivity window
    /// intersects the given period, ordered by event type then tier level
    pub async fn find_effective_tiers(
        &self,
        organization_id: Uuid,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
    ) -> Result<Vec<pricing_tier::Model>> {
        Ok(pricing_tier::Entity::find()
            .filter(pricing_tier::Column::OrganizationId.eq(organization_id))
            .filter(pricing_tier::Column::EffectiveFrom.lt(period_end))
            .filter(
                Condition::any()
                    .add(pricing_tier::Column::EffectiveTo.is_null())
                    .add(pricing_tier::Column::EffectiveTo.gt(period_start)),
            )
            .order_by_asc(pricing_tier::Column::EventType)
            .order_by_asc(pricing_tier::Column::TierLevel)
            .all(self.conn())
            .await?)
    }

    /// Create a pricing tier
    #[allow(clippy::too_many_arguments)]
    pub async fn create_pricing_tier(
        &self,
        organization_id: Uuid,
        event_type: &str,
        tier_level: i32,
        min_quantity: Decimal,
        max_quantity: Option<Decimal>,
        unit_price: Decimal,
        effective_from: DateTime<Utc>,
        effective_to: Option<DateTime<Utc>>,
    ) -> Result<pricing_tier::Model> {
        let model = pricing_tier::ActiveModel {
            id: Set(Uuid::new_v4()),
            organization_id: Set(organization_id),
            event_type: Set(event_type.to_string()),
            tier_level: Set(tier_level),
            min_quantity: Set(min_quantity),
            max_quantity: Set(max_quantity),
            unit_price: Set(unit_price),
            effective_from: Set(effective_from),
            effective_to: Set(effective_to),
            created_at: Set(Utc::now()),
        };

        Ok(model.insert(self.conn()).await?)
    }
}

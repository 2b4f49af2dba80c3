use crate::storage::database::entities::subscription::{self, SubscriptionStatus};
use crate::storage::database::Database;
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

impl Database {
    /// Find a subscription by the PSP's identifier
    pub async fn find_subscription_by_psp_id(
        &self,
        psp_subscription_id: &str,
    ) -> Result<Option<subscription::Model>> {
        Ok(subscription::Entity::find()
            .filter(subscription::Column::PspSubscriptionId.eq(psp_subscription_id))
            .one(self.conn())
            .await?)
    }

    /// Apply a PSP-reported status to the local subscription mirror
    pub async fn update_subscription_status(
        &self,
        psp_subscription_id: &str,
        status: SubscriptionStatus,
        current_period_end: Option<DateTime<Utc>>,
    ) -> Result<Option<subscription::Model>> {
        let Some(existing) = self.find_subscription_by_psp_id(psp_subscription_id).await? else {
            return Ok(None);
        };

        let model = subscription::ActiveModel {
            id: sea_orm::Unchanged(existing.id),
            status: Set(status.as_str().to_string()),
            current_period_end: match current_period_end {
                Some(end) => Set(Some(end)),
                None => sea_orm::NotSet,
            },
            updated_at: Set(Utc::now()),
            ..Default::default()
        };

        Ok(Some(
            subscription::Entity::update(model).exec(self.conn()).await?,
        ))
    }

    /// Register a subscription for an organization
    pub async fn create_subscription(
        &self,
        organization_id: Uuid,
        psp_subscription_id: &str,
        status: SubscriptionStatus,
    ) -> Result<subscription::Model> {
        let now = Utc::now();
        let model = subscription::ActiveModel {
            id: Set(Uuid::new_v4()),
            organization_id: Set(organization_id),
            psp_subscription_id: Set(psp_subscription_id.to_string()),
            status: Set(status.as_str().to_string()),
            current_period_end: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(model.insert(self.conn()).await?)
    }
}

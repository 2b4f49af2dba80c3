use crate::storage::database::entities::rate_limit_policy;
use crate::storage::database::Database;
use crate::utils::error::Result;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

impl Database {
    /// Find the rate-limit policy for an organization, preferring a
    /// key-specific policy over the organization-wide one
    pub async fn find_rate_limit_policy(
        &self,
        organization_id: Uuid,
        api_key_id: Option<Uuid>,
    ) -> Result<Option<rate_limit_policy::Model>> {
        if let Some(key_id) = api_key_id {
            let key_scoped = rate_limit_policy::Entity::find()
                .filter(rate_limit_policy::Column::OrganizationId.eq(organization_id))
                .filter(rate_limit_policy::Column::ApiKeyId.eq(key_id))
                .one(self.conn())
                .await?;
            if key_scoped.is_some() {
                return Ok(key_scoped);
            }
        }

        Ok(rate_limit_policy::Entity::find()
            .filter(rate_limit_policy::Column::OrganizationId.eq(organization_id))
            .filter(rate_limit_policy::Column::ApiKeyId.is_null())
            .one(self.conn())
            .await?)
    }

    /// Create or replace an organization's rate-limit policy
    pub async fn upsert_rate_limit_policy(
        &self,
        organization_id: Uuid,
        api_key_id: Option<Uuid>,
        per_second: Option<i64>,
        per_minute: Option<i64>,
        per_hour: Option<i64>,
    ) -> Result<rate_limit_policy::Model> {
        let existing = self
            .find_rate_limit_policy_exact(organization_id, api_key_id)
            .await?;
        let now = Utc::now();

        match existing {
            Some(row) => {
                let model = rate_limit_policy::ActiveModel {
                    id: sea_orm::Unchanged(row.id),
                    requests_per_second: Set(per_second),
                    requests_per_minute: Set(per_minute),
                    requests_per_hour: Set(per_hour),
                    updated_at: Set(now),
                    ..Default::default()
                };
                Ok(rate_limit_policy::Entity::update(model)
                    .exec(self.conn())
                    .await?)
            }
            None => {
                let model = rate_limit_policy::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    organization_id: Set(organization_id),
                    api_key_id: Set(api_key_id),
                    requests_per_second: Set(per_second),
                    requests_per_minute: Set(per_minute),
                    requests_per_hour: Set(per_hour),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                Ok(model.insert(self.conn()).await?)
            }
        }
    }

    async fn find_rate_limit_policy_exact(
        &self,
        organization_id: Uuid,
        api_key_id: Option<Uuid>,
    ) -> Result<Option<rate_limit_policy::Model>> {
        let mut query = rate_limit_policy::Entity::find()
            .filter(rate_limit_policy::Column::OrganizationId.eq(organization_id));
        query = match api_key_id {
            Some(key_id) => query.filter(rate_limit_policy::Column::ApiKeyId.eq(key_id)),
            None => query.filter(rate_limit_policy::Column::ApiKeyId.is_null()),
        };
        Ok(query.one(self.conn()).await?)
    }
}

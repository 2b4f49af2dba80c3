use crate::storage::database::entities::api_key;
use crate::storage::database::Database;
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

impl Database {
    /// Insert a new API key row
    pub async fn insert_api_key(
        &self,
        organization_id: Uuid,
        name: &str,
        key_hash: &str,
        key_prefix: &str,
        permissions: &[String],
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<api_key::Model> {
        let model = api_key::ActiveModel {
            id: Set(Uuid::new_v4()),
            organization_id: Set(organization_id),
            name: Set(name.to_string()),
            key_hash: Set(key_hash.to_string()),
            key_prefix: Set(key_prefix.to_string()),
            permissions: Set(serde_json::json!(permissions)),
            expires_at: Set(expires_at),
            revoked_at: Set(None),
            last_used_at: Set(None),
            created_at: Set(Utc::now()),
        };

        Ok(model.insert(self.conn()).await?)
    }

    /// Find an API key by its SHA-256 hash
    pub async fn find_api_key_by_hash(&self, key_hash: &str) -> Result<Option<api_key::Model>> {
        Ok(api_key::Entity::find()
            .filter(api_key::Column::KeyHash.eq(key_hash))
            .one(self.conn())
            .await?)
    }

    /// Best-effort `last_used_at` bump
    pub async fn touch_api_key(&self, id: Uuid) -> Result<()> {
        let model = api_key::ActiveModel {
            id: sea_orm::Unchanged(id),
            last_used_at: Set(Some(Utc::now())),
            ..Default::default()
        };
        api_key::Entity::update(model).exec(self.conn()).await?;
        Ok(())
    }

    /// Revoke an API key
    pub async fn revoke_api_key(&self, id: Uuid) -> Result<()> {
        let model = api_key::ActiveModel {
            id: sea_orm::Unchanged(id),
            revoked_at: Set(Some(Utc::now())),
            ..Default::default()
        };
        api_key::Entity::update(model).exec(self.conn()).await?;
        Ok(())
    }

    /// List an organization's API keys, newest first
    pub async fn list_api_keys(&self, organization_id: Uuid) -> Result<Vec<api_key::Model>> {
        Ok(api_key::Entity::find()
            .filter(api_key::Column::OrganizationId.eq(organization_id))
            .order_by_desc(api_key::Column::CreatedAt)
            .all(self.conn())
            .await?)
    }
}

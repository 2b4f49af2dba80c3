use crate::storage::database::entities::organization;
use crate::storage::database::Database;
use crate::utils::error::Result;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

impl Database {
    /// Create an organization with a unique slug
    pub async fn create_organization(&self, name: &str, slug: &str) -> Result<organization::Model> {
        let now = Utc::now();
        let model = organization::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            slug: Set(slug.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(model.insert(self.conn()).await?)
    }

    /// Find an organization by id
    pub async fn find_organization(&self, id: Uuid) -> Result<Option<organization::Model>> {
        Ok(organization::Entity::find_by_id(id).one(self.conn()).await?)
    }

    /// Find an organization by slug
    pub async fn find_organization_by_slug(&self, slug: &str) -> Result<Option<organization::Model>> {
        Ok(organization::Entity::find()
            .filter(organization::Column::Slug.eq(slug))
            .one(self.conn())
            .await?)
    }
}

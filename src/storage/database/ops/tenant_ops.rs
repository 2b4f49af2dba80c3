use crate::storage::database::entities::tenant::{self, TenantStatus};
use crate::storage::database::Database;
use crate::utils::error::Result;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use std::collections::HashMap;
use uuid::Uuid;

impl Database {
    /// Find existing tenants for a set of external ids within an organization
    pub async fn find_tenants_by_external_ids(
        &self,
        organization_id: Uuid,
        external_ids: &[String],
    ) -> Result<Vec<tenant::Model>> {
        if external_ids.is_empty() {
            return Ok(Vec::new());
        }

        Ok(tenant::Entity::find()
            .filter(tenant::Column::OrganizationId.eq(organization_id))
            .filter(tenant::Column::ExternalId.is_in(external_ids.iter().cloned()))
            .all(self.conn())
            .await?)
    }

    /// Insert tenants, silently skipping rows that lost a creation race
    ///
    /// The `(organization_id, external_id)` unique index makes this safe to
    /// call from concurrent ingesters: whoever wins the race owns the row,
    /// everyone else no-ops and re-reads.
    pub async fn insert_tenants_if_absent(
        &self,
        organization_id: Uuid,
        external_ids: &[String],
    ) -> Result<()> {
        if external_ids.is_empty() {
            return Ok(());
        }

        let now = Utc::now();
        let models: Vec<tenant::ActiveModel> = external_ids
            .iter()
            .map(|external_id| tenant::ActiveModel {
                id: Set(Uuid::new_v4()),
                organization_id: Set(organization_id),
                external_id: Set(external_id.clone()),
                name: Set(external_id.clone()),
                status: Set(TenantStatus::Active.as_str().to_string()),
                created_at: Set(now),
                updated_at: Set(now),
            })
            .collect();

        tenant::Entity::insert_many(models)
            .on_conflict(
                OnConflict::columns([tenant::Column::OrganizationId, tenant::Column::ExternalId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.conn())
            .await?;

        Ok(())
    }

    /// Find a tenant by id
    pub async fn find_tenant(&self, id: Uuid) -> Result<Option<tenant::Model>> {
        Ok(tenant::Entity::find_by_id(id).one(self.conn()).await?)
    }

    /// Map tenant ids back to their external ids
    pub async fn tenant_external_ids(
        &self,
        tenant_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, String>> {
        if tenant_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let tenants = tenant::Entity::find()
            .filter(tenant::Column::Id.is_in(tenant_ids.iter().copied()))
            .all(self.conn())
            .await?;

        Ok(tenants.into_iter().map(|t| (t.id, t.external_id)).collect())
    }

    /// Update a tenant's status
    pub async fn set_tenant_status(&self, id: Uuid, status: TenantStatus) -> Result<()> {
        let model = tenant::ActiveModel {
            id: sea_orm::Unchanged(id),
            status: Set(status.as_str().to_string()),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        tenant::Entity::update(model).exec(self.conn()).await?;
        Ok(())
    }

    /// One page of active tenants, ordered by id for stable iteration
    pub async fn active_tenants_page(
        &self,
        page: u64,
        page_size: u64,
    ) -> Result<Vec<tenant::Model>> {
        let paginator = tenant::Entity::find()
            .filter(tenant::Column::Status.eq(TenantStatus::Active.as_str()))
            .order_by_asc(tenant::Column::Id)
            .paginate(self.conn(), page_size);

        Ok(paginator.fetch_page(page).await?)
    }
}

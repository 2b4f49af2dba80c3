use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Organization database model: a customer of the metering service itself.
/// Owns tenants, API keys, policies, pricing tiers, and invoices.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "organizations")]
pub struct Model {
    /// Organization ID (UUID)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// URL-safe slug (unique, embedded in invoice numbers)
    #[sea_orm(unique)]
    pub slug: String,

    /// Creation timestamp
    pub created_at: DateTimeUtc,

    /// Last update timestamp
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Tenants owned by this organization
    #[sea_orm(has_many = "super::tenant::Entity")]
    Tenants,

    /// API keys issued to this organization
    #[sea_orm(has_many = "super::api_key::Entity")]
    ApiKeys,

    /// Invoices billed to this organization's tenants
    #[sea_orm(has_many = "super::invoice::Entity")]
    Invoices,
}

impl Related<super::tenant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tenants.def()
    }
}

impl Related<super::api_key::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApiKeys.def()
    }
}

impl Related<super::invoice::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoices.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

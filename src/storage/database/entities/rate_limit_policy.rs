use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Rate limit policy database model: per-organization request ceilings,
/// optionally scoped to a single API key. Each granularity is optional.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "rate_limit_policies")]
pub struct Model {
    /// Policy ID (UUID)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Owning organization
    pub organization_id: Uuid,

    /// Specific API key this policy applies to (NULL = organization-wide)
    pub api_key_id: Option<Uuid>,

    /// Requests per second ceiling
    pub requests_per_second: Option<i64>,

    /// Requests per minute ceiling
    pub requests_per_minute: Option<i64>,

    /// Requests per hour ceiling
    pub requests_per_hour: Option<i64>,

    /// Creation timestamp
    pub created_at: DateTimeUtc,

    /// Last update timestamp
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Owning organization
    #[sea_orm(
        belongs_to = "super::organization::Entity",
        from = "Column::OrganizationId",
        to = "super::organization::Column::Id"
    )]
    Organization,
}

impl Related<super::organization::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organization.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

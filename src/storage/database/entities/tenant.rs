use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Tenant database model: the organization's customer, whose activity is
/// metered. Created lazily on first event, never hard-deleted.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "tenants")]
pub struct Model {
    /// Tenant ID (UUID)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Owning organization
    pub organization_id: Uuid,

    /// Caller-supplied identifier, unique within the organization
    #[sea_orm(column_type = "String(StringLen::N(100))")]
    pub external_id: String,

    /// Display name (defaults to the external id)
    pub name: String,

    /// Status: active, suspended, or deleted
    pub status: String,

    /// Creation timestamp
    pub created_at: DateTimeUtc,

    /// Last update timestamp
    pub updated_at: DateTimeUtc,
}

/// Tenant lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TenantStatus {
    Active,
    Suspended,
    Deleted,
}

impl TenantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Deleted => "deleted",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "suspended" => Self::Suspended,
            "deleted" => Self::Deleted,
            _ => Self::Active,
        }
    }
}

impl Model {
    /// Tenant status as an enum
    pub fn tenant_status(&self) -> TenantStatus {
        TenantStatus::from_str(&self.status)
    }
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

    /// Events recorded for this tenant
    #[sea_orm(has_many = "super::usage_event::Entity")]
    UsageEvents,

    /// Daily roll-ups for this tenant
    #[sea_orm(has_many = "super::usage_snapshot::Entity")]
    UsageSnapshots,

    /// Quota limits for this tenant
    #[sea_orm(has_many = "super::quota_limit::Entity")]
    QuotaLimits,
}

impl Related<super::organization::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organization.def()
    }
}

impl Related<super::usage_event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UsageEvents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

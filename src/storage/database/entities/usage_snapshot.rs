use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Usage snapshot database model: a daily roll-up of summed quantity per
/// `(tenant, date, event type)`. Upserted, so replays are idempotent.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "usage_snapshots")]
pub struct Model {
    /// Snapshot ID (UUID)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Tenant this roll-up belongs to
    pub tenant_id: Uuid,

    /// Owning organization (denormalized for org-wide reporting)
    pub organization_id: Uuid,

    /// UTC day the roll-up covers
    pub snapshot_date: Date,

    /// Event type being summed
    #[sea_orm(column_type = "String(StringLen::N(100))")]
    pub event_type: String,

    /// Summed quantity for the day
    #[sea_orm(column_type = "Decimal(Some((30, 6)))")]
    pub total_quantity: Decimal,

    /// Creation timestamp
    pub created_at: DateTimeUtc,

    /// Last upsert timestamp
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Tenant this snapshot rolls up
    #[sea_orm(
        belongs_to = "super::tenant::Entity",
        from = "Column::TenantId",
        to = "super::tenant::Column::Id"
    )]
    Tenant,
}

impl Related<super::tenant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tenant.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

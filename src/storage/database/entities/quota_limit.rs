use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Quota limit database model: a per-`(tenant, event type)` ceiling on summed
/// quantity within the current period. Absence of a row means unlimited.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "quota_limits")]
pub struct Model {
    /// Quota ID (UUID)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Tenant the quota applies to
    pub tenant_id: Uuid,

    /// Event type the quota applies to
    #[sea_orm(column_type = "String(StringLen::N(100))")]
    pub event_type: String,

    /// Hard ceiling for the period
    #[sea_orm(column_type = "Decimal(Some((30, 6)))")]
    pub limit_value: Decimal,

    /// Early-warning threshold
    #[sea_orm(column_type = "Decimal(Some((30, 6)))", nullable)]
    pub soft_limit_value: Option<Decimal>,

    /// Enforcement mode: hard, soft, or disabled
    pub enforcement_mode: String,

    /// Extra capacity beyond the limit tolerated under soft enforcement
    #[sea_orm(column_type = "Decimal(Some((30, 6)))", nullable)]
    pub overage_allowed: Option<Decimal>,

    /// While set and in the future, violations are tolerated
    pub grace_period_end: Option<DateTimeUtc>,

    /// Start of the current accounting period; advanced at billing rollover
    pub reset_at: DateTimeUtc,

    /// Creation timestamp
    pub created_at: DateTimeUtc,

    /// Last update timestamp
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Tenant this quota constrains
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

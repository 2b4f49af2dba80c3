use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Pricing tier database model: one step of the per-event-type price curve.
/// Tiers for one event type form a non-overlapping partition of `[0, ∞)`
/// when sorted by `tier_level`; `max_quantity = NULL` means unbounded.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pricing_tiers")]
pub struct Model {
    /// Tier ID (UUID)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Owning organization
    pub organization_id: Uuid,

    /// Event type this tier prices
    #[sea_orm(column_type = "String(StringLen::N(100))")]
    pub event_type: String,

    /// Ordering of the tier within the curve, ascending
    pub tier_level: i32,

    /// Inclusive lower quantity bound
    #[sea_orm(column_type = "Decimal(Some((30, 6)))")]
    pub min_quantity: Decimal,

    /// Exclusive upper quantity bound (NULL = unbounded)
    #[sea_orm(column_type = "Decimal(Some((30, 6)))", nullable)]
    pub max_quantity: Option<Decimal>,

    /// Price per unit in currency units, fixed-point scale 6
    #[sea_orm(column_type = "Decimal(Some((20, 6)))")]
    pub unit_price: Decimal,

    /// Start of the tier's effectivity window
    pub effective_from: DateTimeUtc,

    /// End of the effectivity window (NULL = open-ended)
    pub effective_to: Option<DateTimeUtc>,

    /// Creation timestamp
    pub created_at: DateTimeUtc,
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

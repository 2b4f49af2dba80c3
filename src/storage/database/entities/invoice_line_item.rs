use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Invoice line item database model: one event type's billed quantity with
/// its tier breakdown. `unit_price` is the display-only average
/// `total_price / quantity`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invoice_line_items")]
pub struct Model {
    /// Line item ID (UUID)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Owning invoice
    pub invoice_id: Uuid,

    /// Event type this line bills
    #[sea_orm(column_type = "String(StringLen::N(100))")]
    pub event_type: String,

    /// Total billed quantity
    #[sea_orm(column_type = "Decimal(Some((30, 6)))")]
    pub quantity: Decimal,

    /// Display-only average price per unit
    #[sea_orm(column_type = "Decimal(Some((20, 6)))")]
    pub unit_price: Decimal,

    /// Line total, in cents
    pub total_price: i64,

    /// Per-tier breakdown blob
    #[sea_orm(column_type = "Json")]
    pub tier_breakdown: Json,

    /// Creation timestamp
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Owning invoice
    #[sea_orm(
        belongs_to = "super::invoice::Entity",
        from = "Column::InvoiceId",
        to = "super::invoice::Column::Id"
    )]
    Invoice,
}

impl Related<super::invoice::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoice.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Usage event database model: the atom of billing.
///
/// Invariants enforced here and by the schema:
/// - unique per `(organization_id, idempotency_key)` when a key is present
/// - `billed_at` is non-null iff `invoice_id` is non-null
/// - once `invoice_id` is set it is never mutated
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "usage_events")]
pub struct Model {
    /// Event ID (UUID)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Owning organization
    pub organization_id: Uuid,

    /// Tenant the usage is attributed to
    pub tenant_id: Uuid,

    /// Free-form event type (≤ 100 chars)
    #[sea_orm(column_type = "String(StringLen::N(100))")]
    pub event_type: String,

    /// Metered quantity, fixed-point scale 6, strictly positive
    #[sea_orm(column_type = "Decimal(Some((30, 6)))")]
    pub quantity: Decimal,

    /// Opaque caller-supplied key-value metadata
    #[sea_orm(column_type = "Json", nullable)]
    pub metadata: Option<Json>,

    /// Event timestamp (caller-provided or server-assigned)
    pub timestamp: DateTimeUtc,

    /// At-most-once token, unique per organization when present (≤ 255 chars)
    #[sea_orm(column_type = "String(StringLen::N(255))", nullable)]
    pub idempotency_key: Option<String>,

    /// Invoice this event was billed on, set exactly once
    pub invoice_id: Option<Uuid>,

    /// When the event was billed
    pub billed_at: Option<DateTimeUtc>,

    /// Ingest timestamp
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Tenant that produced this event
    #[sea_orm(
        belongs_to = "super::tenant::Entity",
        from = "Column::TenantId",
        to = "super::tenant::Column::Id"
    )]
    Tenant,

    /// Invoice this event is billed on (weak reference, SET NULL on delete)
    #[sea_orm(
        belongs_to = "super::invoice::Entity",
        from = "Column::InvoiceId",
        to = "super::invoice::Column::Id"
    )]
    Invoice,
}

impl Related<super::tenant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tenant.def()
    }
}

impl Related<super::invoice::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoice.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

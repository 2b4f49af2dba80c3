use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Invoice database model. Monetary amounts are integers in the smallest
/// currency unit (cents).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    /// Invoice ID (UUID)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Owning organization
    pub organization_id: Uuid,

    /// Billed tenant
    pub tenant_id: Uuid,

    /// Human-readable number, globally unique, `INV-{SLUG}-{seq}`
    #[sea_orm(unique)]
    pub invoice_number: String,

    /// Start of the billed period (inclusive)
    pub period_start: DateTimeUtc,

    /// End of the billed period (exclusive)
    pub period_end: DateTimeUtc,

    /// Status: draft, pending, paid, overdue, or cancelled
    pub status: String,

    /// Sum of line item totals, in cents
    pub subtotal: i64,

    /// Tax amount, in cents
    pub tax: i64,

    /// Grand total, in cents
    pub total: i64,

    /// Payment due date
    pub due_date: DateTimeUtc,

    /// When the invoice was paid
    pub paid_at: Option<DateTimeUtc>,

    /// Creation timestamp
    pub created_at: DateTimeUtc,

    /// Last update timestamp
    pub updated_at: DateTimeUtc,
}

/// Invoice lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    Draft,
    Pending,
    Paid,
    Overdue,
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Overdue => "overdue",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "pending" => Self::Pending,
            "paid" => Self::Paid,
            "overdue" => Self::Overdue,
            "cancelled" => Self::Cancelled,
            _ => Self::Draft,
        }
    }

    /// Whether a transition to `next` is legal.
    ///
    /// DRAFT → PENDING → {PAID | OVERDUE}; CANCELLED only from DRAFT or
    /// PENDING. OVERDUE is otherwise a derived view of a past-due PENDING.
    pub fn can_transition_to(&self, next: InvoiceStatus) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::Pending)
                | (Self::Pending, Self::Paid)
                | (Self::Pending, Self::Overdue)
                | (Self::Overdue, Self::Paid)
                | (Self::Draft, Self::Cancelled)
                | (Self::Pending, Self::Cancelled)
        )
    }
}

impl Model {
    /// Invoice status as an enum
    pub fn invoice_status(&self) -> InvoiceStatus {
        InvoiceStatus::from_str(&self.status)
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

    /// Line items on this invoice
    #[sea_orm(has_many = "super::invoice_line_item::Entity")]
    LineItems,

    /// Events billed on this invoice
    #[sea_orm(has_many = "super::usage_event::Entity")]
    UsageEvents,
}

impl Related<super::organization::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organization.def()
    }
}

impl Related<super::invoice_line_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LineItems.def()
    }
}

impl Related<super::usage_event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UsageEvents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::InvoiceStatus;

    #[test]
    fn test_legal_transitions() {
        assert!(InvoiceStatus::Draft.can_transition_to(InvoiceStatus::Pending));
        assert!(InvoiceStatus::Pending.can_transition_to(InvoiceStatus::Paid));
        assert!(InvoiceStatus::Pending.can_transition_to(InvoiceStatus::Overdue));
        assert!(InvoiceStatus::Draft.can_transition_to(InvoiceStatus::Cancelled));
        assert!(InvoiceStatus::Pending.can_transition_to(InvoiceStatus::Cancelled));
    }

    #[test]
    fn test_illegal_transitions() {
        assert!(!InvoiceStatus::Paid.can_transition_to(InvoiceStatus::Cancelled));
        assert!(!InvoiceStatus::Cancelled.can_transition_to(InvoiceStatus::Pending));
        assert!(!InvoiceStatus::Draft.can_transition_to(InvoiceStatus::Paid));
        assert!(!InvoiceStatus::Overdue.can_transition_to(InvoiceStatus::Cancelled));
    }
}

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Subscription database model: the local mirror of the payment processor's
/// subscription state, mutated only by verified PSP webhooks.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "subscriptions")]
pub struct Model {
    /// Subscription ID (UUID)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Owning organization
    pub organization_id: Uuid,

    /// Identifier assigned by the payment processor (unique)
    #[sea_orm(unique)]
    pub psp_subscription_id: String,

    /// Status: active, canceled, past_due, trialing, or unpaid
    pub status: String,

    /// End of the current paid period, as reported by the PSP
    pub current_period_end: Option<DateTimeUtc>,

    /// Creation timestamp
    pub created_at: DateTimeUtc,

    /// Last update timestamp
    pub updated_at: DateTimeUtc,
}

/// Subscription states mirrored from the PSP
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    Active,
    Canceled,
    PastDue,
    Trialing,
    Unpaid,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Canceled => "canceled",
            Self::PastDue => "past_due",
            Self::Trialing => "trialing",
            Self::Unpaid => "unpaid",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "canceled" => Some(Self::Canceled),
            "past_due" => Some(Self::PastDue),
            "trialing" => Some(Self::Trialing),
            "unpaid" => Some(Self::Unpaid),
            _ => None,
        }
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
}

impl Related<super::organization::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organization.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

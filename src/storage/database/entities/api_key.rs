use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// API key database model. Only the SHA-256 hash of the key is stored; the
/// raw value is returned exactly once at creation.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "api_keys")]
pub struct Model {
    /// Key ID (UUID)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Owning organization
    pub organization_id: Uuid,

    /// Key name/description
    pub name: String,

    /// SHA-256 hash of the raw key (unique)
    #[sea_orm(unique)]
    pub key_hash: String,

    /// Short displayable prefix for identification
    pub key_prefix: String,

    /// Granted permissions (subset of `events:write`, `usage:read`)
    #[sea_orm(column_type = "Json")]
    pub permissions: Json,

    /// Expiration date
    pub expires_at: Option<DateTimeUtc>,

    /// Revocation timestamp; set means the key is dead
    pub revoked_at: Option<DateTimeUtc>,

    /// Last successful validation (best-effort)
    pub last_used_at: Option<DateTimeUtc>,

    /// Creation timestamp
    pub created_at: DateTimeUtc,
}

impl Model {
    /// Granted permissions as a string list
    pub fn permission_list(&self) -> Vec<String> {
        serde_json::from_value(self.permissions.clone()).unwrap_or_default()
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

//! API key types and data structures

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// The caller identity resolved from a validated bearer credential
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Organization the key belongs to
    pub organization_id: Uuid,
    /// The validated key's id
    pub api_key_id: Uuid,
    /// Permissions granted to the key
    pub permissions: Vec<String>,
}

impl AuthContext {
    /// Membership test over the granted permission set
    pub fn has_permission(&self, required: &str) -> bool {
        permissions_contain(&self.permissions, required)
    }
}

/// Case-sensitive membership test; no hierarchy, no wildcards
pub(super) fn permissions_contain(set: &[String], required: &str) -> bool {
    set.iter().any(|p| p == required)
}

/// API key creation request
#[derive(Debug, Clone)]
pub struct CreateApiKeyRequest {
    /// Key name/description
    pub name: String,
    /// Owning organization
    pub organization_id: Uuid,
    /// Permissions for the key
    pub permissions: Vec<String>,
    /// Expiration date
    pub expires_at: Option<DateTime<Utc>>,
}

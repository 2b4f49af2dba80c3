//! API key creation and management

use super::permissions;
use super::types::CreateApiKeyRequest;
use crate::storage::database::entities::api_key;
use crate::storage::StorageLayer;
use crate::utils::crypto::{extract_api_key_prefix, generate_api_key, hash_api_key};
use crate::utils::error::{MeterError, Result};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// API key management handler
#[derive(Clone)]
pub struct ApiKeyHandler {
    storage: Arc<StorageLayer>,
}

impl ApiKeyHandler {
    /// Create a new handler
    pub fn new(storage: Arc<StorageLayer>) -> Self {
        Self { storage }
    }

    /// Create a new API key
    ///
    /// Returns the stored row and the raw key. The raw key is never
    /// persisted and cannot be recovered after this call.
    pub async fn create_key(&self, request: CreateApiKeyRequest) -> Result<(api_key::Model, String)> {
        for permission in &request.permissions {
            if !permissions::is_known(permission) {
                return Err(MeterError::validation(
                    "permissions",
                    format!("unknown permission: {}", permission),
                ));
            }
        }

        let raw_key = generate_api_key();
        let key_hash = hash_api_key(&raw_key);
        let key_prefix = extract_api_key_prefix(&raw_key);

        let stored = self
            .storage
            .db()
            .insert_api_key(
                request.organization_id,
                &request.name,
                &key_hash,
                &key_prefix,
                &request.permissions,
                request.expires_at,
            )
            .await?;

        info!("API key created: {} ({})", stored.id, stored.key_prefix);
        Ok((stored, raw_key))
    }

    /// Revoke an API key
    pub async fn revoke_key(&self, key_id: Uuid) -> Result<()> {
        self.storage.db().revoke_api_key(key_id).await?;
        info!("API key revoked: {}", key_id);
        Ok(())
    }

    /// List an organization's API keys
    pub async fn list_keys(&self, organization_id: Uuid) -> Result<Vec<api_key::Model>> {
        self.storage.db().list_api_keys(organization_id).await
    }
}

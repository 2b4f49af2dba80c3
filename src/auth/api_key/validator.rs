//! Bearer credential validation

use super::types::AuthContext;
use crate::storage::StorageLayer;
use crate::utils::crypto::{hash_api_key, API_KEY_PREFIX};
use crate::utils::error::{MeterError, Result};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolves bearer credentials to an organization and permission set
#[derive(Clone)]
pub struct ApiKeyValidator {
    storage: Arc<StorageLayer>,
}

impl ApiKeyValidator {
    /// Create a new validator
    pub fn new(storage: Arc<StorageLayer>) -> Self {
        Self { storage }
    }

    /// Validate a raw bearer credential
    ///
    /// Rejections distinguish invalid, revoked, and expired keys. On success
    /// a `last_used_at` bump is scheduled without blocking the request.
    pub async fn validate(&self, bearer: &str) -> Result<AuthContext> {
        if !bearer.starts_with(API_KEY_PREFIX) {
            debug!("Bearer credential missing brand prefix");
            return Err(MeterError::unauthorized("Invalid API key"));
        }

        let key_hash = hash_api_key(bearer);
        let api_key = match self.storage.db().find_api_key_by_hash(&key_hash).await? {
            Some(key) => key,
            None => {
                debug!("API key not found");
                return Err(MeterError::unauthorized("Invalid API key"));
            }
        };

        if api_key.revoked_at.is_some() {
            debug!("API key {} is revoked", api_key.id);
            return Err(MeterError::unauthorized("API key revoked"));
        }

        if let Some(expires_at) = api_key.expires_at {
            if Utc::now() > expires_at {
                debug!("API key {} is expired", api_key.id);
                return Err(MeterError::unauthorized("API key expired"));
            }
        }

        self.touch_last_used(api_key.id);

        Ok(AuthContext {
            organization_id: api_key.organization_id,
            api_key_id: api_key.id,
            permissions: api_key.permission_list(),
        })
    }

    /// Schedule a best-effort `last_used_at` update
    fn touch_last_used(&self, key_id: uuid::Uuid) {
        let storage = self.storage.clone();
        tokio::spawn(async move {
            if let Err(e) = storage.db().touch_api_key(key_id).await {
                warn!("Failed to update API key last used timestamp: {}", e);
            }
        });
    }
}

//! Tenant resolver implementation

use crate::storage::StorageLayer;
use crate::utils::error::{MeterError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Batched find-or-create of tenants from caller-supplied external ids
#[derive(Clone)]
pub struct TenantResolver {
    storage: Arc<StorageLayer>,
}

impl TenantResolver {
    /// Create a new resolver
    pub fn new(storage: Arc<StorageLayer>) -> Self {
        Self { storage }
    }

    /// Resolve external ids to tenant ids, creating missing tenants
    ///
    /// One batched lookup, one conflict-tolerant insert for the missing set,
    /// one re-read. Concurrent ingesters converge on a single row per
    /// `(organization, external id)` because the insert skips rows whose
    /// unique key already exists.
    pub async fn resolve(
        &self,
        organization_id: Uuid,
        external_ids: &[String],
    ) -> Result<HashMap<String, Uuid>> {
        let mut deduped: Vec<String> = external_ids.to_vec();
        deduped.sort();
        deduped.dedup();

        if deduped.is_empty() {
            return Ok(HashMap::new());
        }

        let existing = self
            .storage
            .db()
            .find_tenants_by_external_ids(organization_id, &deduped)
            .await?;

        let mut resolved: HashMap<String, Uuid> = existing
            .into_iter()
            .map(|t| (t.external_id, t.id))
            .collect();

        let missing: Vec<String> = deduped
            .iter()
            .filter(|id| !resolved.contains_key(*id))
            .cloned()
            .collect();

        if !missing.is_empty() {
            debug!(
                "Creating {} tenants for organization {}",
                missing.len(),
                organization_id
            );
            self.storage
                .db()
                .insert_tenants_if_absent(organization_id, &missing)
                .await?;

            // Re-read to pick up both our rows and any concurrent winners.
            let created = self
                .storage
                .db()
                .find_tenants_by_external_ids(organization_id, &missing)
                .await?;
            for tenant in created {
                resolved.insert(tenant.external_id, tenant.id);
            }
        }

        // The unique constraint guarantees the re-read finds every id.
        for id in &deduped {
            if !resolved.contains_key(id) {
                return Err(MeterError::internal(format!(
                    "tenant resolution failed for external id {}",
                    id
                )));
            }
        }

        Ok(resolved)
    }
}

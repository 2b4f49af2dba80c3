//! Application state shared across HTTP handlers

use crate::auth::{ApiKeyHandler, ApiKeyValidator};
use crate::config::Config;
use crate::core::admission::AdmissionController;
use crate::core::billing::{InvoiceBuilder, SnapshotJob};
use crate::core::idempotency::IdempotencyFilter;
use crate::core::ingest::EventRecorder;
use crate::core::quota::QuotaEngine;
use crate::core::tenants::TenantResolver;
use crate::storage::StorageLayer;
use std::sync::Arc;

/// Shared resources for request handlers
#[derive(Clone)]
pub struct AppState {
    /// Service configuration (shared read-only)
    pub config: Arc<Config>,
    /// Storage layer (store + cache + breaker)
    pub storage: Arc<StorageLayer>,
    /// Credential validator
    pub auth: ApiKeyValidator,
    /// API key management
    pub api_keys: ApiKeyHandler,
    /// Per-organization rate limiting
    pub admission: AdmissionController,
    /// Event ingestion pipeline
    pub recorder: EventRecorder,
    /// Invoice builder
    pub invoices: InvoiceBuilder,
    /// Daily snapshot job
    pub snapshots: SnapshotJob,
}

impl AppState {
    /// Wire up all components over one storage layer
    pub fn new(config: Config, storage: StorageLayer) -> Self {
        let config = Arc::new(config);
        let storage = Arc::new(storage);

        let tenants = TenantResolver::new(storage.clone());
        let idempotency =
            IdempotencyFilter::new(storage.clone(), config.limits().idempotency_ttl_secs);
        let quota = QuotaEngine::new(storage.clone());
        let recorder = EventRecorder::new(
            storage.clone(),
            tenants,
            idempotency,
            quota,
            config.limits().ingest_concurrency,
        );

        Self {
            auth: ApiKeyValidator::new(storage.clone()),
            api_keys: ApiKeyHandler::new(storage.clone()),
            admission: AdmissionController::new(storage.clone()),
            recorder,
            invoices: InvoiceBuilder::new(storage.clone(), config.billing().clone()),
            snapshots: SnapshotJob::new(storage.clone()),
            storage,
            config,
        }
    }
}

//! Core domain logic: the ingestion/enforcement pipeline and the billing
//! engine

/// Per-organization rate limiting (admission control)
pub mod admission;
/// Invoice building and daily snapshots
pub mod billing;
/// Duplicate-event detection
pub mod idempotency;
/// Event ingestion pipeline
pub mod ingest;
/// Per-tenant quota enforcement
pub mod quota;
/// Tenant find-or-create resolution
pub mod tenants;

//! Authentication for the ingest API
//!
//! Bearer credentials are API keys hashed with SHA-256; the raw key is shown
//! exactly once at creation.

/// API key validation and management
pub mod api_key;

pub use api_key::{ApiKeyHandler, ApiKeyValidator, AuthContext};

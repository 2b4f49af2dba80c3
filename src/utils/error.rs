//! Error types for the metering service

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

/// Result type alias for the service
pub type Result<T> = std::result::Result<T, MeterError>;

/// One rejected `(tenant, event type)` quota check, with the data a caller
/// needs to retry correctly
#[derive(Debug, Clone, serde::Serialize)]
pub struct QuotaViolation {
    pub tenant_id: String,
    pub event_type: String,
    pub current: Decimal,
    pub limit: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soft_limit: Option<Decimal>,
    pub enforcement_mode: String,
    pub reset_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grace_period_end: Option<DateTime<Utc>>,
}

/// Main error type for the service
#[derive(Error, Debug)]
pub enum MeterError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Redis errors
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or malformed credential
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Valid credential lacking a required permission
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Request validation failure with the offending field
    #[error("Validation error: {field}: {message}")]
    Validation { field: String, message: String },

    /// Per-organization rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimited {
        limit: u64,
        remaining: u64,
        reset_at: DateTime<Utc>,
        retry_after_secs: u64,
    },

    /// Per-tenant quota exceeded; one violation per rejected
    /// `(tenant, event type)` pair
    #[error("Quota exceeded")]
    QuotaExceeded { violations: Vec<QuotaViolation> },

    /// Unique-constraint conflicts that are not expected control flow
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Crypto errors
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Internal errors that must not leak detail to clients
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MeterError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Whether this error stems from a unique-constraint violation.
    ///
    /// Idempotent upserts treat these as expected control flow: the losing
    /// writer re-reads the winning row instead of failing the request.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::Database(sea_orm::DbErr::Query(sea_orm::RuntimeErr::SqlxError(err)))
            | Self::Database(sea_orm::DbErr::Exec(sea_orm::RuntimeErr::SqlxError(err))) => {
                let msg = err.to_string().to_lowercase();
                msg.contains("unique") || msg.contains("duplicate key")
            }
            Self::Database(sea_orm::DbErr::RecordNotInserted) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_constructor() {
        let err = MeterError::validation("quantity", "must be positive");
        match err {
            MeterError::Validation { field, message } => {
                assert_eq!(field, "quantity");
                assert_eq!(message, "must be positive");
            }
            _ => panic!("expected validation error"),
        }
    }

    #[test]
    fn test_display_does_not_leak_internal_detail() {
        let err = MeterError::internal("pool exhausted at 10.0.0.3");
        // The Display form is only used for logs; HTTP rendering replaces it.
        assert!(err.to_string().contains("Internal error"));
    }

    #[test]
    fn test_record_not_inserted_counts_as_unique_violation() {
        let err = MeterError::Database(sea_orm::DbErr::RecordNotInserted);
        assert!(err.is_unique_violation());
    }
}

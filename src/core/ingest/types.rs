//! Ingest request parsing and validation

use crate::utils::error::{MeterError, Result};
use chrono::{DateTime, Duration, FixedOffset, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

/// One event as submitted by the caller
#[derive(Debug, Clone, Deserialize)]
pub struct EventInput {
    /// Free-form event type (1–100 chars)
    pub event_type: String,
    /// Caller-side tenant identifier (1–100 chars)
    pub tenant_id: String,
    /// Metered quantity (> 0, defaults to 1)
    #[serde(default = "default_quantity")]
    pub quantity: Decimal,
    /// Opaque key-value metadata
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    /// Event time, ISO-8601 with offset; defaults to server time
    #[serde(default)]
    pub timestamp: Option<DateTime<FixedOffset>>,
    /// At-most-once token (≤ 255 chars)
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

fn default_quantity() -> Decimal {
    Decimal::ONE
}

/// A validated event, ready for the pipeline
#[derive(Debug, Clone)]
pub struct ParsedEvent {
    pub tenant_external_id: String,
    pub event_type: String,
    pub quantity: Decimal,
    pub metadata: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
    pub idempotency_key: Option<String>,
}

impl ParsedEvent {
    /// Validate a caller-submitted event
    ///
    /// Late-arriving timestamps are accepted verbatim; future timestamps are
    /// tolerated only within the configured clock-skew window. The server
    /// assigns `now` when the caller omits a timestamp.
    pub fn from_input(
        input: EventInput,
        now: DateTime<Utc>,
        future_skew_hours: i64,
    ) -> Result<Self> {
        if input.event_type.is_empty() || input.event_type.len() > 100 {
            return Err(MeterError::validation(
                "event_type",
                "must be between 1 and 100 characters",
            ));
        }

        if input.tenant_id.is_empty() || input.tenant_id.len() > 100 {
            return Err(MeterError::validation(
                "tenant_id",
                "must be between 1 and 100 characters",
            ));
        }

        if input.quantity <= Decimal::ZERO {
            return Err(MeterError::validation("quantity", "must be positive"));
        }

        if let Some(ref key) = input.idempotency_key {
            if key.is_empty() || key.len() > 255 {
                return Err(MeterError::validation(
                    "idempotency_key",
                    "must be between 1 and 255 characters",
                ));
            }
        }

        let timestamp = match input.timestamp {
            Some(ts) => {
                let ts = ts.with_timezone(&Utc);
                if ts > now + Duration::hours(future_skew_hours) {
                    return Err(MeterError::validation(
                        "timestamp",
                        format!(
                            "must not be more than {} hours in the future",
                            future_skew_hours
                        ),
                    ));
                }
                ts
            }
            None => now,
        };

        Ok(Self {
            tenant_external_id: input.tenant_id,
            event_type: input.event_type,
            quantity: input.quantity.round_dp(6),
            metadata: input.metadata,
            timestamp,
            idempotency_key: input.idempotency_key,
        })
    }
}

/// Per-event ingest result, positionally aligned with the request
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    /// Persisted (or pre-existing) event id
    pub event_id: Uuid,
    /// Whether this input was a replay of an accepted event
    pub deduplicated: bool,
    /// Caller-side tenant identifier
    pub tenant_external_id: String,
    /// Event type
    pub event_type: String,
    /// Idempotency key, if one was supplied
    pub idempotency_key: Option<String>,
}

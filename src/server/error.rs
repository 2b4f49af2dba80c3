//! HTTP error envelope
//!
//! Every error response is JSON of the form
//! `{ "error": "<human>", "code": "<SCREAMING_SNAKE>", "details": { ... } }`.
//! Rate-limit responses carry `Retry-After` and `X-RateLimit-*` headers;
//! quota responses carry the data a caller needs to retry correctly; 5xx
//! responses carry the request id and nothing internal.

use crate::utils::error::{MeterError, QuotaViolation};
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::{json, Value};
use std::fmt;
use tracing::error;

/// An error bound to an HTTP response, with the request id for correlation
#[derive(Debug)]
pub struct ApiError {
    inner: MeterError,
    request_id: Option<String>,
}

impl ApiError {
    /// Wrap a service error with the request's correlation id
    pub fn new(inner: MeterError, request_id: Option<String>) -> Self {
        Self { inner, request_id }
    }

    fn code(&self) -> &'static str {
        match &self.inner {
            MeterError::Unauthorized(_) => "UNAUTHORIZED",
            MeterError::Forbidden(_) => "FORBIDDEN",
            MeterError::Validation { .. } => "INVALID_REQUEST",
            MeterError::RateLimited { .. } => "RATE_LIMIT_EXCEEDED",
            MeterError::QuotaExceeded { .. } => "QUOTA_EXCEEDED",
            MeterError::NotFound(_) => "NOT_FOUND",
            MeterError::Conflict(_) => "CONFLICT",
            _ => "INTERNAL_ERROR",
        }
    }

    fn message(&self) -> String {
        match &self.inner {
            MeterError::Unauthorized(msg) => msg.clone(),
            MeterError::Forbidden(msg) => msg.clone(),
            MeterError::Validation { field, message } => format!("{}: {}", field, message),
            MeterError::RateLimited { .. } => "Rate limit exceeded".to_string(),
            MeterError::QuotaExceeded { .. } => "Quota exceeded".to_string(),
            MeterError::NotFound(msg) => msg.clone(),
            MeterError::Conflict(msg) => msg.clone(),
            // Internal detail never leaks; it is logged with the request id.
            _ => "Internal server error".to_string(),
        }
    }

    fn details(&self) -> Option<Value> {
        match &self.inner {
            MeterError::Validation { field, message } => Some(json!({
                "field": field,
                "message": message,
            })),
            MeterError::RateLimited {
                limit,
                remaining,
                reset_at,
                retry_after_secs,
            } => Some(json!({
                "limit": limit,
                "remaining": remaining,
                "reset_at": reset_at.to_rfc3339(),
                "retry_after": retry_after_secs,
            })),
            MeterError::QuotaExceeded { violations } => Some(quota_details(violations)),
            _ => self.request_id.as_ref().map(|id| json!({ "request_id": id })),
        }
    }
}

fn violation_details(violation: &QuotaViolation) -> Value {
    let mut details = serde_json::Map::new();
    details.insert("current".into(), json!(violation.current));
    details.insert("limit".into(), json!(violation.limit));
    if let Some(soft) = violation.soft_limit {
        details.insert("softLimit".into(), json!(soft));
    }
    details.insert(
        "enforcementMode".into(),
        json!(violation.enforcement_mode.to_uppercase()),
    );
    details.insert("resetAt".into(), json!(violation.reset_at.to_rfc3339()));
    if let Some(grace) = violation.grace_period_end {
        details.insert("gracePeriodEnd".into(), json!(grace.to_rfc3339()));
    }
    Value::Object(details)
}

fn quota_details(violations: &[QuotaViolation]) -> Value {
    match violations {
        [single] => violation_details(single),
        many => json!({
            "violations": many
                .iter()
                .map(|v| json!({
                    "tenant_id": v.tenant_id,
                    "event_type": v.event_type,
                    "details": violation_details(v),
                }))
                .collect::<Vec<_>>(),
        }),
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.inner {
            MeterError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            MeterError::Forbidden(_) | MeterError::QuotaExceeded { .. } => StatusCode::FORBIDDEN,
            MeterError::Validation { .. } => StatusCode::BAD_REQUEST,
            MeterError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            MeterError::NotFound(_) => StatusCode::NOT_FOUND,
            MeterError::Conflict(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            error!(
                "Request {} failed: {}",
                self.request_id.as_deref().unwrap_or("unknown"),
                self.inner
            );
        }

        let mut body = serde_json::Map::new();
        body.insert("error".into(), json!(self.message()));
        body.insert("code".into(), json!(self.code()));
        if let Some(details) = self.details() {
            body.insert("details".into(), details);
        }

        let mut builder = HttpResponse::build(self.status_code());

        if let MeterError::RateLimited {
            limit,
            remaining,
            reset_at,
            retry_after_secs,
        } = &self.inner
        {
            builder.insert_header(("Retry-After", retry_after_secs.to_string()));
            builder.insert_header(("X-RateLimit-Limit", limit.to_string()));
            builder.insert_header(("X-RateLimit-Remaining", remaining.to_string()));
            builder.insert_header(("X-RateLimit-Reset", reset_at.timestamp().to_string()));
        }

        builder.json(Value::Object(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn violation() -> QuotaViolation {
        QuotaViolation {
            tenant_id: "t1".to_string(),
            event_type: "api_request".to_string(),
            current: dec!(9),
            limit: dec!(10),
            soft_limit: None,
            enforcement_mode: "hard".to_string(),
            reset_at: Utc::now(),
            grace_period_end: None,
        }
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (MeterError::unauthorized("no"), StatusCode::UNAUTHORIZED),
            (MeterError::forbidden("no"), StatusCode::FORBIDDEN),
            (
                MeterError::validation("f", "bad"),
                StatusCode::BAD_REQUEST,
            ),
            (
                MeterError::QuotaExceeded {
                    violations: vec![violation()],
                },
                StatusCode::FORBIDDEN,
            ),
            (
                MeterError::internal("boom"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::new(err, None).status_code(), status);
        }
    }

    #[test]
    fn test_internal_error_hides_detail() {
        let api = ApiError::new(
            MeterError::internal("connection pool exhausted at 10.0.0.3"),
            Some("req-1".to_string()),
        );
        assert_eq!(api.message(), "Internal server error");
        assert_eq!(api.code(), "INTERNAL_ERROR");
        let details = api.details().unwrap();
        assert_eq!(details["request_id"], "req-1");
    }

    #[test]
    fn test_single_quota_violation_flattens_into_details() {
        let api = ApiError::new(
            MeterError::QuotaExceeded {
                violations: vec![violation()],
            },
            None,
        );
        let details = api.details().unwrap();
        assert_eq!(details["enforcementMode"], "HARD");
        assert!(details.get("violations").is_none());
    }

    #[test]
    fn test_batch_quota_violations_render_as_array() {
        let api = ApiError::new(
            MeterError::QuotaExceeded {
                violations: vec![violation(), violation()],
            },
            None,
        );
        let details = api.details().unwrap();
        let violations = details["violations"].as_array().unwrap();
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0]["tenant_id"], "t1");
        assert_eq!(violations[0]["event_type"], "api_request");
    }

    #[test]
    fn test_rate_limit_details_carry_retry_data() {
        let api = ApiError::new(
            MeterError::RateLimited {
                limit: 5,
                remaining: 0,
                reset_at: Utc::now(),
                retry_after_secs: 1,
            },
            None,
        );
        assert_eq!(api.code(), "RATE_LIMIT_EXCEEDED");
        let details = api.details().unwrap();
        assert_eq!(details["retry_after"], 1);
        assert_eq!(details["limit"], 5);
    }
}

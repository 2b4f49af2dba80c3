//! Payment-processor webhook

use crate::server::error::ApiError;
use crate::server::routes::api_err;
use crate::server::state::AppState;
use crate::storage::database::entities::subscription::SubscriptionStatus;
use crate::utils::crypto::verify_hmac_signature;
use crate::utils::error::MeterError;
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

/// PSP event payload (only the subscription-status contract is consumed)
#[derive(Debug, Deserialize)]
struct PspEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: PspSubscriptionData,
}

#[derive(Debug, Deserialize)]
struct PspSubscriptionData {
    subscription_id: String,
    status: String,
    #[serde(default)]
    current_period_end: Option<DateTime<Utc>>,
}

/// POST /webhooks/psp
///
/// HMAC-signed; mutates local subscription status and nothing else.
pub async fn psp_webhook(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let signature = req
        .headers()
        .get("x-psp-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| api_err(&req, MeterError::unauthorized("Missing webhook signature")))?;

    let secret = &state.config.external().psp_webhook_secret;
    let valid = verify_hmac_signature(secret, &body, signature).map_err(|e| api_err(&req, e))?;
    if secret.is_empty() || !valid {
        return Err(api_err(
            &req,
            MeterError::unauthorized("Invalid webhook signature"),
        ));
    }

    let event: PspEvent = serde_json::from_slice(&body).map_err(|e| {
        api_err(
            &req,
            MeterError::validation("body", format!("malformed webhook payload: {}", e)),
        )
    })?;

    let Some(status) = SubscriptionStatus::parse(&event.data.status) else {
        return Err(api_err(
            &req,
            MeterError::validation(
                "status",
                format!("unknown subscription status: {}", event.data.status),
            ),
        ));
    };

    let updated = state
        .storage
        .db()
        .update_subscription_status(
            &event.data.subscription_id,
            status,
            event.data.current_period_end,
        )
        .await
        .map_err(|e| api_err(&req, e))?;

    match updated {
        Some(subscription) => {
            info!(
                "PSP event {} moved subscription {} to {}",
                event.event_type, subscription.psp_subscription_id, subscription.status
            );
        }
        None => {
            // Unknown subscriptions are acknowledged, not retried forever.
            warn!(
                "PSP event {} for unknown subscription {}",
                event.event_type, event.data.subscription_id
            );
        }
    }

    Ok(HttpResponse::Ok().json(json!({ "received": true })))
}

//! Event ingestion and listing endpoints

use crate::auth::api_key::permissions;
use crate::core::admission::{AdmissionDecision, PolicySnapshot};
use crate::core::ingest::{EventInput, IngestOutcome, ParsedEvent};
use crate::server::error::ApiError;
use crate::server::routes::{api_err, bearer_token};
use crate::server::state::AppState;
use crate::storage::database::ops::EventFilter;
use crate::utils::error::MeterError;
use actix_web::{web, HttpRequest, HttpResponse, HttpResponseBuilder};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use uuid::Uuid;

/// Request body: a single event or `{ "events": [ ... ] }`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum IngestBody {
    Batch { events: Vec<EventInput> },
    Single(EventInput),
}

/// POST /api/v1/events
pub async fn post_events(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<IngestBody>,
) -> Result<HttpResponse, ApiError> {
    let now = Utc::now();

    let bearer = bearer_token(&req)?;
    let ctx = state
        .auth
        .validate(&bearer)
        .await
        .map_err(|e| api_err(&req, e))?;

    if !ctx.has_permission(permissions::EVENTS_WRITE) {
        return Err(api_err(
            &req,
            MeterError::forbidden("API key lacks events:write"),
        ));
    }

    let decision = admit(&req, &state, ctx.organization_id, ctx.api_key_id, now).await?;

    let (inputs, single) = match body.into_inner() {
        IngestBody::Single(event) => (vec![event], true),
        IngestBody::Batch { events } => (events, false),
    };

    let max_batch = state.config.limits().max_batch_size;
    if inputs.is_empty() {
        return Err(api_err(
            &req,
            MeterError::validation("events", "batch must contain at least one event"),
        ));
    }
    if inputs.len() > max_batch {
        return Err(api_err(
            &req,
            MeterError::validation(
                "events",
                format!("batch must contain at most {} events", max_batch),
            ),
        ));
    }

    let skew = state.config.limits().future_skew_hours;
    let mut parsed = Vec::with_capacity(inputs.len());
    for input in inputs {
        parsed.push(ParsedEvent::from_input(input, now, skew).map_err(|e| api_err(&req, e))?);
    }

    let outcomes = state
        .recorder
        .ingest(ctx.organization_id, parsed, now)
        .await
        .map_err(|e| api_err(&req, e))?;

    let mut builder = HttpResponse::Ok();
    rate_limit_headers(&mut builder, &decision);

    if single {
        let outcome = &outcomes[0];
        Ok(builder.json(json!({
            "success": true,
            "event_id": outcome.event_id,
            "deduplicated": outcome.deduplicated,
        })))
    } else {
        Ok(builder.json(batch_response(&outcomes)))
    }
}

/// Run the admission check and convert a rejection into the 429 envelope
async fn admit(
    req: &HttpRequest,
    state: &AppState,
    organization_id: Uuid,
    api_key_id: Uuid,
    now: DateTime<Utc>,
) -> Result<AdmissionDecision, ApiError> {
    let policy = state
        .storage
        .db()
        .find_rate_limit_policy(organization_id, Some(api_key_id))
        .await
        .map_err(|e| api_err(req, e))?;

    let snapshot = policy
        .as_ref()
        .map(PolicySnapshot::from)
        .unwrap_or_default();

    let decision = state
        .admission
        .admit(&organization_id.to_string(), &snapshot, now)
        .await
        .map_err(|e| api_err(req, e))?;

    if !decision.allowed {
        return Err(api_err(
            req,
            MeterError::RateLimited {
                limit: decision.limit,
                remaining: decision.remaining,
                reset_at: decision.reset_at,
                retry_after_secs: decision.retry_after_secs.unwrap_or(1),
            },
        ));
    }

    Ok(decision)
}

fn rate_limit_headers(builder: &mut HttpResponseBuilder, decision: &AdmissionDecision) {
    if decision.limit == u64::MAX {
        return;
    }
    builder.insert_header(("X-RateLimit-Limit", decision.limit.to_string()));
    builder.insert_header(("X-RateLimit-Remaining", decision.remaining.to_string()));
    builder.insert_header(("X-RateLimit-Reset", decision.reset_at.timestamp().to_string()));
}

fn batch_response(outcomes: &[IngestOutcome]) -> serde_json::Value {
    let new_events = outcomes.iter().filter(|o| !o.deduplicated).count();
    json!({
        "success": true,
        "count": outcomes.len(),
        "new_events": new_events,
        "deduplicated": outcomes.len() - new_events,
        "event_ids": outcomes.iter().map(|o| o.event_id).collect::<Vec<_>>(),
        "events": outcomes
            .iter()
            .map(|o| {
                let mut event = serde_json::Map::new();
                event.insert("id".into(), json!(o.event_id));
                event.insert("tenant_id".into(), json!(o.tenant_external_id));
                event.insert("event_type".into(), json!(o.event_type));
                if let Some(key) = &o.idempotency_key {
                    event.insert("idempotency_key".into(), json!(key));
                }
                event.insert("deduplicated".into(), json!(o.deduplicated));
                serde_json::Value::Object(event)
            })
            .collect::<Vec<_>>(),
    })
}

/// Query parameters for event listing
#[derive(Debug, Deserialize)]
pub struct ListEventsQuery {
    tenant_id: Option<String>,
    event_type: Option<String>,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    limit: Option<u64>,
}

/// GET /api/v1/events
pub async fn get_events(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<ListEventsQuery>,
) -> Result<HttpResponse, ApiError> {
    let bearer = bearer_token(&req)?;
    let ctx = state
        .auth
        .validate(&bearer)
        .await
        .map_err(|e| api_err(&req, e))?;

    if !ctx.has_permission(permissions::USAGE_READ) {
        return Err(api_err(
            &req,
            MeterError::forbidden("API key lacks usage:read"),
        ));
    }

    let limit = query.limit.unwrap_or(100);
    if limit == 0 || limit > 1000 {
        return Err(api_err(
            &req,
            MeterError::validation("limit", "must be between 1 and 1000"),
        ));
    }

    // A tenant filter names the caller's external id; an unknown id simply
    // matches nothing.
    let tenant_uuid = match &query.tenant_id {
        Some(external_id) => {
            let found = state
                .storage
                .db()
                .find_tenants_by_external_ids(ctx.organization_id, &[external_id.clone()])
                .await
                .map_err(|e| api_err(&req, e))?;
            match found.into_iter().next() {
                Some(tenant) => Some(tenant.id),
                None => {
                    return Ok(HttpResponse::Ok().json(json!({
                        "success": true,
                        "count": 0,
                        "events": [],
                    })))
                }
            }
        }
        None => None,
    };

    let filter = EventFilter {
        tenant_id: tenant_uuid,
        event_type: query.event_type.clone(),
        start_date: query.start_date,
        end_date: query.end_date,
        limit,
    };

    let events = state
        .storage
        .db()
        .list_events(ctx.organization_id, &filter)
        .await
        .map_err(|e| api_err(&req, e))?;

    let tenant_ids: Vec<Uuid> = events.iter().map(|e| e.tenant_id).collect();
    let external_ids: HashMap<Uuid, String> = state
        .storage
        .db()
        .tenant_external_ids(&tenant_ids)
        .await
        .map_err(|e| api_err(&req, e))?;

    let rows: Vec<serde_json::Value> = events
        .iter()
        .map(|event| {
            json!({
                "id": event.id,
                "tenant_id": external_ids.get(&event.tenant_id),
                "event_type": event.event_type,
                "quantity": event.quantity,
                "metadata": event.metadata,
                "timestamp": event.timestamp.to_rfc3339(),
                "idempotency_key": event.idempotency_key,
                "invoice_id": event.invoice_id,
                "billed_at": event.billed_at.map(|t| t.to_rfc3339()),
            })
        })
        .collect();

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "count": rows.len(),
        "events": rows,
    })))
}

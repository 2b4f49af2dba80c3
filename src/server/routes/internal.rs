//! Operator-only scheduled operations

use crate::server::error::ApiError;
use crate::server::routes::{api_err, bearer_token};
use crate::server::state::AppState;
use crate::utils::error::MeterError;
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

fn require_cron_secret(req: &HttpRequest, state: &AppState) -> Result<(), ApiError> {
    let token = bearer_token(req)?;
    let secret = &state.config.external().cron_secret;
    if secret.is_empty() || token != *secret {
        return Err(api_err(
            req,
            MeterError::unauthorized("Invalid operator credential"),
        ));
    }
    Ok(())
}

/// Request body for the snapshot job
#[derive(Debug, Default, Deserialize)]
pub struct SnapshotRequest {
    /// UTC day to roll up; defaults to yesterday
    date: Option<NaiveDate>,
}

/// POST /internal/snapshots
pub async fn post_snapshots(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: Option<web::Json<SnapshotRequest>>,
) -> Result<HttpResponse, ApiError> {
    require_cron_secret(&req, &state)?;

    let date = body
        .map(|b| b.into_inner())
        .unwrap_or_default()
        .date
        .unwrap_or_else(|| (Utc::now() - Duration::days(1)).date_naive());

    let summary = state
        .snapshots
        .build_for_date(date)
        .await
        .map_err(|e| api_err(&req, e))?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "date": summary.date.to_string(),
        "tenants_processed": summary.tenants_processed,
        "snapshots_written": summary.snapshots_written,
    })))
}

/// Request body for an invoice build
#[derive(Debug, Deserialize)]
pub struct InvoiceRequest {
    tenant_id: Uuid,
    period_start: DateTime<Utc>,
    period_end: DateTime<Utc>,
}

/// POST /internal/invoices
pub async fn post_invoices(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<InvoiceRequest>,
) -> Result<HttpResponse, ApiError> {
    require_cron_secret(&req, &state)?;

    let invoice = state
        .invoices
        .build_invoice(body.tenant_id, body.period_start, body.period_end)
        .await
        .map_err(|e| api_err(&req, e))?;

    let line_items = state
        .storage
        .db()
        .find_line_items(invoice.id)
        .await
        .map_err(|e| api_err(&req, e))?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "invoice": {
            "id": invoice.id,
            "invoice_number": invoice.invoice_number,
            "status": invoice.status,
            "period_start": invoice.period_start.to_rfc3339(),
            "period_end": invoice.period_end.to_rfc3339(),
            "subtotal": invoice.subtotal,
            "tax": invoice.tax,
            "total": invoice.total,
            "due_date": invoice.due_date.to_rfc3339(),
            "line_items": line_items
                .iter()
                .map(|item| json!({
                    "event_type": item.event_type,
                    "quantity": item.quantity,
                    "unit_price": item.unit_price,
                    "total_price": item.total_price,
                    "tier_breakdown": item.tier_breakdown,
                }))
                .collect::<Vec<_>>(),
        },
    })))
}

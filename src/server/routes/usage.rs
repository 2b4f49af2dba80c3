//! Grouped usage aggregates

use crate::auth::api_key::permissions;
use crate::server::error::ApiError;
use crate::server::routes::{api_err, bearer_token};
use crate::server::state::AppState;
use crate::utils::error::MeterError;
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use std::collections::{BTreeMap, HashSet};

/// Query parameters for usage aggregation
#[derive(Debug, Deserialize)]
pub struct UsageQuery {
    group_by: Option<String>,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
}

/// GET /api/v1/usage
pub async fn get_usage(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<UsageQuery>,
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

    let group_by = query.group_by.as_deref().unwrap_or("event_type");
    let now = Utc::now();

    // Default to the current calendar month.
    let start = query.start_date.unwrap_or_else(|| {
        Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
            .single()
            .unwrap_or(now)
    });
    let end = query.end_date.unwrap_or(now);

    if end < start {
        return Err(api_err(
            &req,
            MeterError::validation("end_date", "must not be before start_date"),
        ));
    }

    let usage = match group_by {
        "event_type" => {
            let rows = state
                .storage
                .db()
                .aggregate_usage_by_event_type(ctx.organization_id, start, end)
                .await
                .map_err(|e| api_err(&req, e))?;
            rows.into_iter()
                .map(|row| {
                    json!({
                        "group": row.group_key,
                        "total_quantity": row.total_quantity,
                        "event_count": row.event_count,
                    })
                })
                .collect::<Vec<_>>()
        }
        "tenant" => {
            let rows = state
                .storage
                .db()
                .aggregate_usage_by_tenant(ctx.organization_id, start, end)
                .await
                .map_err(|e| api_err(&req, e))?;
            let ids: Vec<_> = rows.iter().map(|(id, _, _)| *id).collect();
            let external = state
                .storage
                .db()
                .tenant_external_ids(&ids)
                .await
                .map_err(|e| api_err(&req, e))?;
            rows.into_iter()
                .map(|(tenant_id, total, count)| {
                    json!({
                        "group": external.get(&tenant_id),
                        "total_quantity": total,
                        "event_count": count,
                    })
                })
                .collect()
        }
        "day" => {
            // Day grouping reads the daily roll-ups where they exist.
            let first_day = start.date_naive();
            let last_day = end.date_naive();
            let snapshots = state
                .storage
                .db()
                .find_org_snapshots_in_range(ctx.organization_id, first_day, last_day)
                .await
                .map_err(|e| api_err(&req, e))?;

            let mut per_day: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
            let mut covered: HashSet<NaiveDate> = HashSet::new();
            for snapshot in snapshots {
                covered.insert(snapshot.snapshot_date);
                *per_day.entry(snapshot.snapshot_date).or_default() += snapshot.total_quantity;
            }

            // Days the snapshot job has not rolled up yet (today, typically)
            // fall back to raw events, so this grouping agrees with the
            // event_type and tenant groupings over the same window.
            let mut day = first_day;
            while day <= last_day {
                if !covered.contains(&day) {
                    let window_start = day
                        .and_hms_opt(0, 0, 0)
                        .map(|dt| dt.and_utc())
                        .unwrap_or(start)
                        .max(start);
                    let window_end = day
                        .succ_opt()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                        .map(|dt| dt.and_utc())
                        .unwrap_or(end)
                        .min(end + Duration::microseconds(1));

                    let total = state
                        .storage
                        .db()
                        .sum_org_usage_in_window(ctx.organization_id, window_start, window_end)
                        .await
                        .map_err(|e| api_err(&req, e))?;
                    if total > Decimal::ZERO {
                        *per_day.entry(day).or_default() += total;
                    }
                }

                match day.succ_opt() {
                    Some(next) => day = next,
                    None => break,
                }
            }

            per_day
                .into_iter()
                .map(|(date, total)| {
                    json!({
                        "group": date.to_string(),
                        "total_quantity": total,
                    })
                })
                .collect()
        }
        other => {
            return Err(api_err(
                &req,
                MeterError::validation(
                    "group_by",
                    format!("unknown grouping: {} (expected event_type, tenant, or day)", other),
                ),
            ))
        }
    };

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "group_by": group_by,
        "start_date": start.to_rfc3339(),
        "end_date": end.to_rfc3339(),
        "usage": usage,
    })))
}

//! Health check endpoint

use crate::server::state::AppState;
use crate::storage::breaker::BreakerState;
use actix_web::{web, HttpResponse};
use serde_json::json;

/// GET /health
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let storage = state.storage.health_check().await;

    let status = if storage.overall { "healthy" } else { "degraded" };
    let breaker = match state.storage.breaker.state() {
        BreakerState::Closed => "closed",
        BreakerState::Open => "open",
    };

    HttpResponse::Ok().json(json!({
        "status": status,
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "storage": storage,
        "cache_breaker": breaker,
    }))
}

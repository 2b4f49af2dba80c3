//! HTTP route modules

pub mod events;
pub mod health;
pub mod internal;
pub mod usage;
pub mod webhooks;

use crate::server::error::ApiError;
use crate::utils::error::MeterError;
use actix_web::{web, HttpRequest};

/// Configure all routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/events", web::post().to(events::post_events))
            .route("/events", web::get().to(events::get_events))
            .route("/usage", web::get().to(usage::get_usage)),
    )
    .service(
        web::scope("/internal")
            .route("/snapshots", web::post().to(internal::post_snapshots))
            .route("/invoices", web::post().to(internal::post_invoices)),
    )
    .route("/webhooks/psp", web::post().to(webhooks::psp_webhook))
    .route("/health", web::get().to(health::health_check));
}

/// The request's correlation id, if the middleware assigned one
pub fn request_id(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

/// Bind a service error to this request for the envelope renderer
pub fn api_err(req: &HttpRequest, err: MeterError) -> ApiError {
    ApiError::new(err, request_id(req))
}

/// Extract the bearer token from the Authorization header
pub fn bearer_token(req: &HttpRequest) -> Result<String, ApiError> {
    let header = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| api_err(req, MeterError::unauthorized("Missing Authorization header")))?;

    match header.strip_prefix("Bearer ") {
        Some(token) if !token.is_empty() => Ok(token.to_string()),
        _ => Err(api_err(
            req,
            MeterError::unauthorized("Authorization header must be a Bearer token"),
        )),
    }
}

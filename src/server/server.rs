//! HTTP server assembly

use crate::config::Config;
use crate::server::middleware::RequestIdMiddleware;
use crate::server::routes::configure_routes;
use crate::server::state::AppState;
use crate::storage::StorageLayer;
use crate::utils::error::{MeterError, Result};
use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpResponse, HttpServer as ActixHttpServer};
use std::time::Duration;
use tracing::info;

/// HTTP server
pub struct HttpServer {
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server: connect storage, run migrations, wire state
    pub async fn new(config: Config) -> Result<Self> {
        info!("Creating HTTP server");

        let storage = StorageLayer::new(&config).await?;
        storage.migrate().await?;

        let state = AppState::new(config, storage);
        Ok(Self { state })
    }

    /// Start serving
    pub async fn start(self) -> Result<()> {
        let server_config = self.state.config.server().clone();
        let state = web::Data::new(self.state);
        let deadline = Duration::from_secs(server_config.request_deadline_secs);

        info!(
            "Starting server on {}:{}",
            server_config.host, server_config.port
        );

        let mut server = ActixHttpServer::new(move || {
            // Malformed JSON renders in the standard envelope instead of the
            // actix default.
            let json_config = web::JsonConfig::default().error_handler(|err, _req| {
                let message = err.to_string();
                actix_web::error::InternalError::from_response(
                    err,
                    HttpResponse::BadRequest().json(serde_json::json!({
                        "error": message,
                        "code": "INVALID_REQUEST",
                    })),
                )
                .into()
            });

            App::new()
                .app_data(state.clone())
                .app_data(json_config)
                .wrap(Logger::default())
                .wrap(RequestIdMiddleware)
                .wrap(Cors::default().allow_any_origin().allow_any_header().allow_any_method())
                .configure(configure_routes)
        })
        .client_request_timeout(deadline)
        .bind((server_config.host.as_str(), server_config.port))
        .map_err(|e| MeterError::Config(format!("Failed to bind server: {}", e)))?;

        if server_config.workers > 0 {
            server = server.workers(server_config.workers);
        }

        server.run().await.map_err(MeterError::Io)
    }
}

/// Load configuration and run the server until shutdown
///
/// Reads `config/metergate.yaml` when present, then lets environment
/// variables take precedence.
pub async fn run_server() -> Result<()> {
    let file_config = match tokio::fs::metadata("config/metergate.yaml").await {
        Ok(_) => Some(Config::from_file("config/metergate.yaml").await?),
        Err(_) => None,
    };
    let env_config = Config::from_env()?;

    let config = match file_config {
        Some(base) => base.merge(env_config),
        None => env_config,
    };

    let server = HttpServer::new(config).await?;
    server.start().await
}

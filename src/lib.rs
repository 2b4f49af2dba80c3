//! # metergate
//!
//! A billing-grade usage metering service for multi-tenant SaaS: ingests
//! usage events from customer backends, enforces per-tenant quotas and
//! per-organization rate limits in real time, and produces tiered-pricing
//! invoices whose line items are traceable to the events they bill.
//!
//! ## Architecture
//!
//! - **Ingest pipeline**: credential validation → rate-limit admission →
//!   payload validation → tenant resolution → idempotency filtering → quota
//!   check-and-reserve → durable persistence → rolling counters
//! - **Billing**: daily usage snapshots and an invoice builder that walks an
//!   ordered tier curve per event type, committing invoice, line items, and
//!   event back-links in one transaction
//! - **Storage**: a SQL system of record (the source of truth for every
//!   invariant) plus a Redis fast-path cache behind a circuit breaker; every
//!   cache interaction degrades to a store fallback
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use metergate::{Config, Metergate};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let service = Metergate::new(config).await?;
//!     service.run().await?;
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]

pub mod auth;
pub mod config;
pub mod core;
pub mod server;
pub mod storage;
pub mod utils;

pub use config::Config;
pub use utils::error::{MeterError, Result};

/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The metering service: configuration plus a ready-to-run HTTP server
pub struct Metergate {
    server: server::HttpServer,
}

impl Metergate {
    /// Create a new service instance
    pub async fn new(config: Config) -> Result<Self> {
        let server = server::HttpServer::new(config).await?;
        Ok(Self { server })
    }

    /// Run the service until shutdown
    pub async fn run(self) -> Result<()> {
        self.server.start().await
    }
}

//! Database storage implementation using SeaORM

/// Database entities module
pub mod entities;
/// Database migration module
pub mod migration;
/// Query operations grouped per aggregate
pub mod ops;

use crate::config::DatabaseConfig;
use crate::utils::error::{MeterError, Result};
use migration::Migrator;
use sea_orm::{ConnectOptions, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::time::Duration;
use tracing::{debug, info, warn};

/// System-of-record database handle
pub struct Database {
    pub(crate) db: DatabaseConnection,
}

impl Database {
    /// Create a new database connection
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let mut opt = ConnectOptions::new(config.url.clone());
        opt.max_connections(config.max_connections)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(config.connection_timeout))
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(3600))
            .sqlx_logging(true)
            .sqlx_logging_level(log::LevelFilter::Debug);

        let db = sea_orm::Database::connect(opt)
            .await
            .map_err(MeterError::Database)?;

        info!("Database connection established");
        Ok(Self { db })
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        info!("Running database migrations...");
        Migrator::up(&self.db, None).await.map_err(|e| {
            warn!("Migration failed: {}", e);
            MeterError::Database(e)
        })?;
        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Get the underlying connection
    pub fn conn(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Health check
    pub async fn health_check(&self) -> Result<()> {
        debug!("Performing database health check");
        self.db.ping().await.map_err(MeterError::Database)?;
        Ok(())
    }

    /// Close the database connection
    pub async fn close(self) -> Result<()> {
        self.db.close().await.map_err(MeterError::Database)?;
        Ok(())
    }
}

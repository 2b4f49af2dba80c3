//! Configuration management for the metering service
//!
//! Configuration is loaded from a YAML file, from environment variables, or
//! both (environment takes precedence through `merge`).

pub mod models;

pub use models::*;

use crate::utils::error::{MeterError, Result};
use std::path::Path;
use tracing::{debug, info};

/// Main configuration struct for the service
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Service configuration
    pub service: ServiceConfig,
}

impl Config {
    /// Load configuration from file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {:?}", path);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| MeterError::Config(format!("Failed to read config file: {}", e)))?;

        let service: ServiceConfig = serde_yaml::from_str(&content)
            .map_err(|e| MeterError::Config(format!("Failed to parse config: {}", e)))?;

        let config = Self { service };
        config.validate()?;

        debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        let service = ServiceConfig::from_env()?;
        let config = Self { service };

        config.validate()?;
        Ok(config)
    }

    /// Get server configuration
    pub fn server(&self) -> &ServerConfig {
        &self.service.server
    }

    /// Get storage configuration
    pub fn storage(&self) -> &StorageConfig {
        &self.service.storage
    }

    /// Get billing configuration
    pub fn billing(&self) -> &BillingConfig {
        &self.service.billing
    }

    /// Get cache/limit tuning
    pub fn limits(&self) -> &LimitsConfig {
        &self.service.limits
    }

    /// Get external collaborator settings
    pub fn external(&self) -> &ExternalConfig {
        &self.service.external
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        debug!("Validating configuration");

        self.service
            .server
            .validate()
            .map_err(|e| MeterError::Config(format!("Server config error: {}", e)))?;
        self.service
            .billing
            .validate()
            .map_err(|e| MeterError::Config(format!("Billing config error: {}", e)))?;
        self.service
            .limits
            .validate()
            .map_err(|e| MeterError::Config(format!("Limits config error: {}", e)))?;

        debug!("Configuration validation completed");
        Ok(())
    }

    /// Merge with another configuration (other takes precedence)
    pub fn merge(mut self, other: Self) -> Self {
        self.service = self.service.merge(other.service);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_config_from_file() {
        let config_content = r#"
server:
  host: "127.0.0.1"
  port: 8080

storage:
  database:
    url: "postgresql://localhost/metergate"
  redis:
    url: "redis://localhost:6379"

billing:
  tax_rate: 0.10
  due_days: 30

external:
  app_url: "https://billing.example.com"
  cron_secret: "operator-secret"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(config_content.as_bytes()).unwrap();

        let config = Config::from_file(temp_file.path()).await.unwrap();

        assert_eq!(config.server().host, "127.0.0.1");
        assert_eq!(config.server().port, 8080);
        assert_eq!(config.billing().due_days, 30);
        assert_eq!(config.external().cron_secret, "operator-secret");
    }

    #[test]
    fn test_default_config_validates() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_merge_prefers_other() {
        let base = Config::default();
        let mut other = Config::default();
        other.service.server.port = 9999;
        let merged = base.merge(other);
        assert_eq!(merged.server().port, 9999);
    }
}

//! HTTP server configuration

use serde::{Deserialize, Serialize};

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind host
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Worker threads (0 = actix default)
    #[serde(default)]
    pub workers: usize,
    /// Per-request deadline in seconds
    #[serde(default = "default_request_deadline")]
    pub request_deadline_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: 0,
            request_deadline_secs: default_request_deadline(),
        }
    }
}

impl ServerConfig {
    /// Validate server configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.host.is_empty() {
            return Err("host must not be empty".to_string());
        }
        if self.port == 0 {
            return Err("port must be non-zero".to_string());
        }
        if self.request_deadline_secs == 0 {
            return Err("request_deadline_secs must be non-zero".to_string());
        }
        Ok(())
    }

    /// Merge server configurations
    pub fn merge(mut self, other: Self) -> Self {
        if other.host != default_host() && !other.host.is_empty() {
            self.host = other.host;
        }
        if other.port != default_port() {
            self.port = other.port;
        }
        if other.workers != 0 {
            self.workers = other.workers;
        }
        if other.request_deadline_secs != default_request_deadline() {
            self.request_deadline_secs = other.request_deadline_secs;
        }
        self
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_deadline() -> u64 {
    30
}

//! External collaborator settings

use serde::{Deserialize, Serialize};

/// External collaborator settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExternalConfig {
    /// Base URL used in generated links
    #[serde(default)]
    pub app_url: String,
    /// Bearer secret for the scheduled-operation endpoints
    #[serde(default)]
    pub cron_secret: String,
    /// Payment-processor API credential
    #[serde(default)]
    pub psp_secret: String,
    /// Payment-processor webhook signing secret
    #[serde(default)]
    pub psp_webhook_secret: String,
}

impl ExternalConfig {
    /// Merge external configurations
    pub fn merge(mut self, other: Self) -> Self {
        if !other.app_url.is_empty() {
            self.app_url = other.app_url;
        }
        if !other.cron_secret.is_empty() {
            self.cron_secret = other.cron_secret;
        }
        if !other.psp_secret.is_empty() {
            self.psp_secret = other.psp_secret;
        }
        if !other.psp_webhook_secret.is_empty() {
            self.psp_webhook_secret = other.psp_webhook_secret;
        }
        self
    }
}

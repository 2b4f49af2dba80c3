//! Billing configuration

use serde::{Deserialize, Serialize};

/// Billing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingConfig {
    /// Tax rate applied to invoice subtotals
    #[serde(default = "default_tax_rate")]
    pub tax_rate: f64,
    /// Days after period end until an invoice is due
    #[serde(default = "default_due_days")]
    pub due_days: i64,
    /// Maximum wall-clock seconds for a single invoice build
    #[serde(default = "default_build_timeout")]
    pub build_timeout_secs: u64,
    /// Bounded retries for invoice-number collisions
    #[serde(default = "default_number_retries")]
    pub invoice_number_retries: u32,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            tax_rate: default_tax_rate(),
            due_days: default_due_days(),
            build_timeout_secs: default_build_timeout(),
            invoice_number_retries: default_number_retries(),
        }
    }
}

impl BillingConfig {
    /// Validate billing configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..1.0).contains(&self.tax_rate) {
            return Err("tax_rate must be in [0, 1)".to_string());
        }
        if self.due_days <= 0 {
            return Err("due_days must be positive".to_string());
        }
        if self.invoice_number_retries == 0 {
            return Err("invoice_number_retries must be non-zero".to_string());
        }
        Ok(())
    }

    /// Merge billing configurations
    pub fn merge(mut self, other: Self) -> Self {
        if (other.tax_rate - default_tax_rate()).abs() > f64::EPSILON {
            self.tax_rate = other.tax_rate;
        }
        if other.due_days != default_due_days() {
            self.due_days = other.due_days;
        }
        if other.build_timeout_secs != default_build_timeout() {
            self.build_timeout_secs = other.build_timeout_secs;
        }
        if other.invoice_number_retries != default_number_retries() {
            self.invoice_number_retries = other.invoice_number_retries;
        }
        self
    }
}

fn default_tax_rate() -> f64 {
    0.10
}

fn default_due_days() -> i64 {
    30
}

fn default_build_timeout() -> u64 {
    300
}

fn default_number_retries() -> u32 {
    8
}

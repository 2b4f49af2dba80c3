//! Quota engine types and the pure decision matrix

use crate::storage::database::entities::quota_limit;
use crate::utils::error::QuotaViolation;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Closed set of enforcement modes; implementations pattern-match, never
/// subtype
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnforcementMode {
    /// Reject beyond the limit (grace period excepted)
    Hard,
    /// Reject beyond limit + overage allowance (grace period excepted)
    Soft,
    /// Never reject; counters still track usage
    Disabled,
}

impl EnforcementMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hard => "hard",
            Self::Soft => "soft",
            Self::Disabled => "disabled",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "hard" => Self::Hard,
            "soft" => Self::Soft,
            _ => Self::Disabled,
        }
    }
}

/// One pre-summed `(tenant, event type)` quantity to check and reserve
#[derive(Debug, Clone)]
pub struct QuotaCharge {
    pub tenant_id: Uuid,
    /// External id, carried for error payloads
    pub tenant_external_id: String,
    pub event_type: String,
    pub quantity: Decimal,
}

/// Outcome of a quota check
#[derive(Debug, Clone)]
pub struct QuotaDecision {
    pub allowed: bool,
    /// Soft-limit early warning; never set in disabled mode
    pub warning: bool,
    pub mode: EnforcementMode,
    pub current: Decimal,
    pub projected: Decimal,
    /// None when no quota row exists (unlimited)
    pub limit: Option<Decimal>,
    pub soft_limit: Option<Decimal>,
    pub reset_at: Option<DateTime<Utc>>,
    pub grace_period_end: Option<DateTime<Utc>>,
}

impl QuotaDecision {
    /// The decision for a pair with no configured quota
    pub fn unlimited(current: Decimal, quantity: Decimal) -> Self {
        Self {
            allowed: true,
            warning: false,
            mode: EnforcementMode::Disabled,
            current,
            projected: current + quantity,
            limit: None,
            soft_limit: None,
            reset_at: None,
            grace_period_end: None,
        }
    }

    /// Render this rejection as an error payload
    pub fn violation(&self, charge: &QuotaCharge) -> QuotaViolation {
        QuotaViolation {
            tenant_id: charge.tenant_external_id.clone(),
            event_type: charge.event_type.clone(),
            current: self.current,
            limit: self.limit.unwrap_or_default(),
            soft_limit: self.soft_limit,
            enforcement_mode: self.mode.as_str().to_string(),
            reset_at: self.reset_at.unwrap_or_else(Utc::now),
            grace_period_end: self.grace_period_end,
        }
    }
}

/// The decision matrix over a loaded quota row
///
/// | mode     | outcome                                                |
/// |----------|--------------------------------------------------------|
/// | disabled | allow                                                  |
/// | hard     | allow iff `projected ≤ limit` or in grace              |
/// | soft     | allow iff `projected ≤ limit + overage` or in grace    |
pub(super) fn decide(
    quota: &quota_limit::Model,
    current: Decimal,
    quantity: Decimal,
    now: DateTime<Utc>,
) -> QuotaDecision {
    let mode = EnforcementMode::parse(&quota.enforcement_mode);
    let projected = current + quantity;
    let in_grace = quota.grace_period_end.map_or(false, |end| now < end);

    let allowed = match mode {
        EnforcementMode::Disabled => true,
        EnforcementMode::Hard => projected <= quota.limit_value || in_grace,
        EnforcementMode::Soft => {
            let ceiling = quota.limit_value + quota.overage_allowed.unwrap_or_default();
            projected <= ceiling || in_grace
        }
    };

    let warning = mode != EnforcementMode::Disabled
        && quota
            .soft_limit_value
            .map_or(false, |soft| projected > soft);

    QuotaDecision {
        allowed,
        warning,
        mode,
        current,
        projected,
        limit: Some(quota.limit_value),
        soft_limit: quota.soft_limit_value,
        reset_at: Some(quota.reset_at),
        grace_period_end: quota.grace_period_end,
    }
}

/// Period component of the counter key, derived from the quota's reset
/// boundary so a new period starts from zero automatically
pub(super) fn period_key(reset_at: DateTime<Utc>) -> String {
    reset_at.format("%Y-%m").to_string()
}

/// Counter key for a `(tenant, event type, period)` triple
pub(super) fn counter_key(tenant_id: Uuid, event_type: &str, reset_at: DateTime<Utc>) -> String {
    format!(
        "quota:{}:{}:{}",
        tenant_id,
        event_type,
        period_key(reset_at)
    )
}

const MICROS_PER_UNIT: i64 = 1_000_000;

/// Fixed-point quantity to cache-counter micro-units
pub(super) fn to_micros(quantity: Decimal) -> i64 {
    (quantity * Decimal::from(MICROS_PER_UNIT))
        .round()
        .try_into()
        .unwrap_or(i64::MAX)
}

/// Cache-counter micro-units back to a fixed-point quantity
pub(super) fn from_micros(micros: i64) -> Decimal {
    Decimal::from(micros) / Decimal::from(MICROS_PER_UNIT)
}

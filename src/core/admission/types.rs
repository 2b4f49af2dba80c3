//! Admission controller types and window math

use crate::storage::database::entities::rate_limit_policy;
use chrono::{DateTime, TimeZone, Utc};

/// Window granularities a policy may configure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Second,
    Minute,
    Hour,
}

impl Granularity {
    /// Window length in seconds
    pub fn secs(&self) -> i64 {
        match self {
            Self::Second => 1,
            Self::Minute => 60,
            Self::Hour => 3600,
        }
    }

    /// Bucket-key label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Second => "sec",
            Self::Minute => "min",
            Self::Hour => "hour",
        }
    }

    /// Start of the window containing `now`
    pub fn window_start(&self, now: DateTime<Utc>) -> i64 {
        let ts = now.timestamp();
        ts - ts.rem_euclid(self.secs())
    }

    /// Start of the next window after `now`
    pub fn next_window(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let start = self.window_start(now) + self.secs();
        Utc.timestamp_opt(start, 0).single().unwrap_or(now)
    }

    /// Bucket TTL: twice the window so late readers still see the count
    pub fn bucket_ttl(&self) -> u64 {
        (self.secs() * 2) as u64
    }
}

/// The limits configured for one identifier
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicySnapshot {
    /// Requests per second
    pub per_second: Option<u64>,
    /// Requests per minute
    pub per_minute: Option<u64>,
    /// Requests per hour
    pub per_hour: Option<u64>,
}

impl PolicySnapshot {
    /// The configured (granularity, limit) pairs
    pub fn limits(&self) -> Vec<(Granularity, u64)> {
        let mut limits = Vec::new();
        if let Some(limit) = self.per_second {
            limits.push((Granularity::Second, limit));
        }
        if let Some(limit) = self.per_minute {
            limits.push((Granularity::Minute, limit));
        }
        if let Some(limit) = self.per_hour {
            limits.push((Granularity::Hour, limit));
        }
        limits
    }

    /// Whether any limit is configured
    pub fn is_empty(&self) -> bool {
        self.per_second.is_none() && self.per_minute.is_none() && self.per_hour.is_none()
    }
}

impl From<&rate_limit_policy::Model> for PolicySnapshot {
    fn from(model: &rate_limit_policy::Model) -> Self {
        Self {
            per_second: model.requests_per_second.map(|v| v.max(0) as u64),
            per_minute: model.requests_per_minute.map(|v| v.max(0) as u64),
            per_hour: model.requests_per_hour.map(|v| v.max(0) as u64),
        }
    }
}

/// Admission decision
#[derive(Debug, Clone)]
pub struct AdmissionDecision {
    /// Whether the request is admitted
    pub allowed: bool,
    /// The most restrictive configured limit
    pub limit: u64,
    /// Remaining requests under the most restrictive limit
    pub remaining: u64,
    /// When the binding window resets
    pub reset_at: DateTime<Utc>,
    /// Seconds to wait before retrying (rejections only)
    pub retry_after_secs: Option<u64>,
}

impl AdmissionDecision {
    /// The fail-open decision used when no policy applies or the cache is
    /// unavailable
    pub fn unlimited(now: DateTime<Utc>) -> Self {
        Self {
            allowed: true,
            limit: u64::MAX,
            remaining: u64::MAX,
            reset_at: now,
            retry_after_secs: None,
        }
    }
}

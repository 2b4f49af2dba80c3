//! Quota enforcement: per-`(tenant, event type)` current-period accounting
//!
//! Counters live in the fast-path cache as micro-unit integers keyed by
//! period, so the reserve is one atomic `INCRBY`; a rejected reservation is
//! compensated immediately. A fresh period key is created with `SET NX`
//! already carrying the store's historical total, so no reader can observe a
//! partially seeded counter. When the cache is unavailable the current total
//! is computed from the store (`SUM(quantity)` since the period reset).

mod engine;
#[cfg(test)]
mod tests;
mod types;

pub use engine::QuotaEngine;
pub use types::{EnforcementMode, QuotaCharge, QuotaDecision};

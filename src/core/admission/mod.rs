//! Admission control: per-organization sliding-window rate limiting
//!
//! Buckets live in the fast-path cache keyed by
//! `(identifier, granularity, window start)`. The check phase reads every
//! bucket without incrementing so a rejected request never consumes
//! capacity; only when all limits pass are the buckets bumped in one
//! pipelined round-trip. When the cache is unavailable admission fails open.

mod controller;
#[cfg(test)]
mod tests;
mod types;

pub use controller::AdmissionController;
pub use types::{AdmissionDecision, Granularity, PolicySnapshot};

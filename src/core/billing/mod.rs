//! Billing: tiered pricing, invoice building, and daily snapshots
//!
//! Every dollar on an invoice traces back to the events it bills: the commit
//! back-links exactly the events whose quantities the line items sum, in one
//! transaction, and the `invoice_id IS NULL` filter keeps concurrent builds
//! from double-billing.

mod invoice_builder;
mod snapshots;
#[cfg(test)]
mod tests;
mod tiering;

pub use invoice_builder::InvoiceBuilder;
pub use snapshots::{SnapshotJob, SnapshotRunSummary};
pub use tiering::{price_quantity, PricedLine, TierBreakdownEntry, TierSpec};

//! Event ingestion: the end-to-end accept path
//!
//! validate → admit → parse → resolve tenants → classify duplicates →
//! check-and-reserve quota → persist → warm idempotency cache → update
//! rolling counters. Batches are all-or-nothing; responses are positionally
//! aligned with inputs.

mod counters;
mod recorder;
#[cfg(test)]
mod tests;
mod types;

pub use recorder::EventRecorder;
pub use types::{EventInput, IngestOutcome, ParsedEvent};

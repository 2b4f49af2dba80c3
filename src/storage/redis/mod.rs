//! Redis fast-path cache implementation
//!
//! ## Module Structure
//!
//! - `pool` - Connection pool and core connection management
//! - `cache` - Basic cache operations (get, set, delete)
//! - `batch` - Batch operations (mget, mset, pipelined counters)
//! - `atomic` - Atomic increment/decrement operations

mod atomic;
mod batch;
mod cache;
mod pool;
#[cfg(test)]
mod tests;

pub use pool::{RedisConnection, RedisPool};

//! Circuit breaker for the fast-path cache
//!
//! The cache is never authoritative: every cache interaction is paired with a
//! store fallback. After a run of consecutive cache failures the breaker
//! opens and all cache operations short-circuit straight to the fallback
//! until the cool-down elapses.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    /// Cache operations are attempted normally
    Closed,
    /// Cache operations are skipped until the cool-down elapses
    Open,
}

/// Consecutive-failure circuit breaker
pub struct CacheBreaker {
    failure_threshold: u32,
    cooldown: Duration,
    consecutive_failures: AtomicU32,
    opened_at: Mutex<Option<Instant>>,
}

impl CacheBreaker {
    /// Create a new breaker
    pub fn new(failure_threshold: u32, cooldown: Duration) -> Self {
        Self {
            failure_threshold,
            cooldown,
            consecutive_failures: AtomicU32::new(0),
            opened_at: Mutex::new(None),
        }
    }

    /// Whether a cache operation may be attempted right now
    ///
    /// An open breaker auto-closes once the cool-down has elapsed; the next
    /// operation then probes the cache again.
    pub fn allow(&self) -> bool {
        let mut opened_at = self.opened_at.lock();
        match *opened_at {
            None => true,
            Some(at) => {
                if at.elapsed() >= self.cooldown {
                    debug!("Cache breaker cool-down elapsed, probing cache again");
                    *opened_at = None;
                    self.consecutive_failures.store(0, Ordering::Relaxed);
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Record a successful cache operation
    pub fn record_success(&self) {
        self.consecutive_failures.store(0, Ordering::Relaxed);
    }

    /// Record a failed cache operation, opening the breaker at the threshold
    pub fn record_failure(&self) {
        let failures = self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
        if failures >= self.failure_threshold {
            let mut opened_at = self.opened_at.lock();
            if opened_at.is_none() {
                warn!(
                    "Cache breaker opening after {} consecutive failures",
                    failures
                );
                *opened_at = Some(Instant::now());
            }
        }
    }

    /// Current breaker state
    pub fn state(&self) -> BreakerState {
        if self.opened_at.lock().is_some() {
            BreakerState::Open
        } else {
            BreakerState::Closed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stays_closed_below_threshold() {
        let breaker = CacheBreaker::new(5, Duration::from_secs(30));
        for _ in 0..4 {
            breaker.record_failure();
        }
        assert_eq!(breaker.state(), BreakerState::Closed);
        assert!(breaker.allow());
    }

    #[test]
    fn test_opens_at_threshold() {
        let breaker = CacheBreaker::new(5, Duration::from_secs(30));
        for _ in 0..5 {
            breaker.record_failure();
        }
        assert_eq!(breaker.state(), BreakerState::Open);
        assert!(!breaker.allow());
    }

    #[test]
    fn test_success_resets_failure_run() {
        let breaker = CacheBreaker::new(5, Duration::from_secs(30));
        for _ in 0..4 {
            breaker.record_failure();
        }
        breaker.record_success();
        for _ in 0..4 {
            breaker.record_failure();
        }
        assert_eq!(breaker.state(), BreakerState::Closed);
    }

    #[test]
    fn test_cooldown_closes_breaker() {
        let breaker = CacheBreaker::new(1, Duration::from_millis(0));
        breaker.record_failure();
        assert_eq!(breaker.state(), BreakerState::Open);
        // Zero cool-down: the very next allow() probe closes it.
        assert!(breaker.allow());
        assert_eq!(breaker.state(), BreakerState::Closed);
    }
}

//! Admission controller tests

use super::controller::bucket_key;
use super::types::{AdmissionDecision, Granularity, PolicySnapshot};
use chrono::{TimeZone, Utc};

#[test]
fn test_window_start_floors_to_granularity() {
    let now = Utc.with_ymd_and_hms(2025, 1, 15, 10, 37, 42).unwrap();

    assert_eq!(Granularity::Second.window_start(now), now.timestamp());
    assert_eq!(
        Granularity::Minute.window_start(now),
        Utc.with_ymd_and_hms(2025, 1, 15, 10, 37, 0)
            .unwrap()
            .timestamp()
    );
    assert_eq!(
        Granularity::Hour.window_start(now),
        Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0)
            .unwrap()
            .timestamp()
    );
}

#[test]
fn test_next_window_is_start_plus_granularity() {
    let now = Utc.with_ymd_and_hms(2025, 1, 15, 10, 37, 42).unwrap();

    assert_eq!(
        Granularity::Minute.next_window(now),
        Utc.with_ymd_and_hms(2025, 1, 15, 10, 38, 0).unwrap()
    );
    assert_eq!(
        Granularity::Hour.next_window(now),
        Utc.with_ymd_and_hms(2025, 1, 15, 11, 0, 0).unwrap()
    );
}

#[test]
fn test_bucket_ttl_is_twice_the_window() {
    assert_eq!(Granularity::Second.bucket_ttl(), 2);
    assert_eq!(Granularity::Minute.bucket_ttl(), 120);
    assert_eq!(Granularity::Hour.bucket_ttl(), 7200);
}

#[test]
fn test_bucket_keys_differ_per_granularity() {
    let now = Utc.with_ymd_and_hms(2025, 1, 15, 10, 37, 42).unwrap();
    let sec = bucket_key("org-1", Granularity::Second, now);
    let min = bucket_key("org-1", Granularity::Minute, now);
    assert_ne!(sec, min);
    assert!(sec.starts_with("ratelimit:org-1:sec:"));
    assert!(min.starts_with("ratelimit:org-1:min:"));
}

#[test]
fn test_bucket_keys_roll_over_with_the_window() {
    let now = Utc.with_ymd_and_hms(2025, 1, 15, 10, 37, 59).unwrap();
    let next = Utc.with_ymd_and_hms(2025, 1, 15, 10, 38, 0).unwrap();
    assert_ne!(
        bucket_key("org-1", Granularity::Minute, now),
        bucket_key("org-1", Granularity::Minute, next)
    );
}

#[test]
fn test_empty_policy_has_no_limits() {
    let policy = PolicySnapshot::default();
    assert!(policy.is_empty());
    assert!(policy.limits().is_empty());
}

#[test]
fn test_policy_limits_ordering() {
    let policy = PolicySnapshot {
        per_second: Some(5),
        per_minute: Some(100),
        per_hour: None,
    };
    let limits = policy.limits();
    assert_eq!(limits.len(), 2);
    assert_eq!(limits[0], (Granularity::Second, 5));
    assert_eq!(limits[1], (Granularity::Minute, 100));
}

#[test]
fn test_unlimited_decision() {
    let now = Utc::now();
    let decision = AdmissionDecision::unlimited(now);
    assert!(decision.allowed);
    assert_eq!(decision.limit, u64::MAX);
    assert!(decision.retry_after_secs.is_none());
}

//! Quota decision matrix tests

use super::types::{
    counter_key, decide, from_micros, period_key, to_micros, EnforcementMode,
};
use crate::storage::database::entities::quota_limit;
use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

fn quota(
    mode: &str,
    limit: Decimal,
    soft: Option<Decimal>,
    overage: Option<Decimal>,
    grace: Option<chrono::DateTime<Utc>>,
) -> quota_limit::Model {
    let now = Utc::now();
    quota_limit::Model {
        id: Uuid::new_v4(),
        tenant_id: Uuid::new_v4(),
        event_type: "api_request".to_string(),
        limit_value: limit,
        soft_limit_value: soft,
        enforcement_mode: mode.to_string(),
        overage_allowed: overage,
        grace_period_end: grace,
        reset_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        created_at: now,
        updated_at: now,
    }
}

#[test]
fn test_hard_mode_allows_up_to_limit() {
    let q = quota("hard", dec!(10), None, None, None);
    let d = decide(&q, dec!(9), dec!(1), Utc::now());
    assert!(d.allowed);
    assert_eq!(d.projected, dec!(10));
}

#[test]
fn test_hard_mode_rejects_beyond_limit() {
    let q = quota("hard", dec!(10), None, None, None);
    let d = decide(&q, dec!(9), dec!(2), Utc::now());
    assert!(!d.allowed);
}

#[test]
fn test_hard_mode_rejects_microunit_over_limit() {
    // At exactly the limit, one more millionth is over.
    let q = quota("hard", dec!(10), None, None, None);
    let d = decide(&q, dec!(10), dec!(0.000001), Utc::now());
    assert!(!d.allowed);
}

#[test]
fn test_soft_mode_admits_microunit_only_with_overage() {
    let with_overage = quota("soft", dec!(10), None, Some(dec!(1)), None);
    let d = decide(&with_overage, dec!(10), dec!(0.000001), Utc::now());
    assert!(d.allowed);

    let without_overage = quota("soft", dec!(10), None, None, None);
    let d = decide(&without_overage, dec!(10), dec!(0.000001), Utc::now());
    assert!(!d.allowed);
}

#[test]
fn test_soft_mode_rejects_beyond_overage() {
    let q = quota("soft", dec!(10), None, Some(dec!(2)), None);
    let d = decide(&q, dec!(11), dec!(2), Utc::now());
    assert!(!d.allowed);
}

#[test]
fn test_disabled_mode_always_allows() {
    let q = quota("disabled", dec!(10), Some(dec!(5)), None, None);
    let d = decide(&q, dec!(1000), dec!(1000), Utc::now());
    assert!(d.allowed);
}

#[test]
fn test_disabled_mode_never_warns() {
    let q = quota("disabled", dec!(10), Some(dec!(5)), None, None);
    let d = decide(&q, dec!(100), dec!(1), Utc::now());
    assert!(!d.warning);
}

#[test]
fn test_grace_period_overrides_hard_rejection() {
    let grace = Utc::now() + Duration::hours(1);
    let q = quota("hard", dec!(10), None, None, Some(grace));
    let d = decide(&q, dec!(50), dec!(1), Utc::now());
    assert!(d.allowed);
}

#[test]
fn test_expired_grace_period_does_not_apply() {
    let grace = Utc::now() - Duration::hours(1);
    let q = quota("hard", dec!(10), None, None, Some(grace));
    let d = decide(&q, dec!(50), dec!(1), Utc::now());
    assert!(!d.allowed);
}

#[test]
fn test_soft_limit_warning() {
    let q = quota("hard", dec!(100), Some(dec!(80)), None, None);
    let d = decide(&q, dec!(80), dec!(1), Utc::now());
    assert!(d.allowed);
    assert!(d.warning);

    let below = decide(&q, dec!(70), dec!(1), Utc::now());
    assert!(!below.warning);
}

#[test]
fn test_mode_parse_round_trip() {
    assert_eq!(EnforcementMode::parse("hard"), EnforcementMode::Hard);
    assert_eq!(EnforcementMode::parse("soft"), EnforcementMode::Soft);
    assert_eq!(EnforcementMode::parse("disabled"), EnforcementMode::Disabled);
    // Unknown modes degrade to disabled rather than inventing enforcement.
    assert_eq!(EnforcementMode::parse("strict"), EnforcementMode::Disabled);
}

#[test]
fn test_period_key_embeds_reset_month() {
    let reset = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    assert_eq!(period_key(reset), "2025-01");

    let next_period = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
    assert_eq!(period_key(next_period), "2025-02");
}

#[test]
fn test_counter_key_changes_on_rollover() {
    let tenant = Uuid::new_v4();
    let january = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let february = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
    assert_ne!(
        counter_key(tenant, "api_request", january),
        counter_key(tenant, "api_request", february)
    );
}

#[test]
fn test_micros_round_trip() {
    assert_eq!(to_micros(dec!(1)), 1_000_000);
    assert_eq!(to_micros(dec!(0.000001)), 1);
    assert_eq!(from_micros(1_500_000), dec!(1.5));
    assert_eq!(from_micros(to_micros(dec!(123.456789))), dec!(123.456789));
}

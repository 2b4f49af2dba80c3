//! Ingest pipeline tests

use super::counters;
use super::recorder::{sum_charges, EventDisposition};
use super::types::{EventInput, ParsedEvent};
use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use uuid::Uuid;

fn input(event_type: &str, tenant: &str) -> EventInput {
    EventInput {
        event_type: event_type.to_string(),
        tenant_id: tenant.to_string(),
        quantity: dec!(1),
        metadata: None,
        timestamp: None,
        idempotency_key: None,
    }
}

fn parsed(tenant: &str, event_type: &str, quantity: rust_decimal::Decimal) -> ParsedEvent {
    ParsedEvent {
        tenant_external_id: tenant.to_string(),
        event_type: event_type.to_string(),
        quantity,
        metadata: None,
        timestamp: Utc::now(),
        idempotency_key: None,
    }
}

#[test]
fn test_valid_input_parses() {
    let now = Utc::now();
    let event = ParsedEvent::from_input(input("api_request", "t1"), now, 24).unwrap();
    assert_eq!(event.event_type, "api_request");
    assert_eq!(event.quantity, dec!(1));
    assert_eq!(event.timestamp, now);
}

#[test]
fn test_empty_event_type_rejected() {
    let now = Utc::now();
    assert!(ParsedEvent::from_input(input("", "t1"), now, 24).is_err());
}

#[test]
fn test_oversized_event_type_rejected() {
    let now = Utc::now();
    let long = "x".repeat(101);
    assert!(ParsedEvent::from_input(input(&long, "t1"), now, 24).is_err());
}

#[test]
fn test_nonpositive_quantity_rejected() {
    let now = Utc::now();
    let mut bad = input("api_request", "t1");
    bad.quantity = dec!(0);
    assert!(ParsedEvent::from_input(bad.clone(), now, 24).is_err());
    bad.quantity = dec!(-1);
    assert!(ParsedEvent::from_input(bad, now, 24).is_err());
}

#[test]
fn test_oversized_idempotency_key_rejected() {
    let now = Utc::now();
    let mut bad = input("api_request", "t1");
    bad.idempotency_key = Some("k".repeat(256));
    assert!(ParsedEvent::from_input(bad, now, 24).is_err());
}

#[test]
fn test_quantity_rounds_to_scale_six() {
    let now = Utc::now();
    let mut fine = input("api_request", "t1");
    fine.quantity = dec!(1.123456789);
    let event = ParsedEvent::from_input(fine, now, 24).unwrap();
    assert_eq!(event.quantity, dec!(1.123457));
}

#[test]
fn test_past_timestamp_accepted_verbatim() {
    let now = Utc::now();
    let mut late = input("api_request", "t1");
    let old = (now - Duration::days(90)).fixed_offset();
    late.timestamp = Some(old);
    let event = ParsedEvent::from_input(late, now, 24).unwrap();
    assert_eq!(event.timestamp, old);
}

#[test]
fn test_future_timestamp_within_skew_accepted() {
    let now = Utc::now();
    let mut soon = input("api_request", "t1");
    soon.timestamp = Some((now + Duration::hours(2)).fixed_offset());
    assert!(ParsedEvent::from_input(soon, now, 24).is_ok());
}

#[test]
fn test_future_timestamp_beyond_skew_rejected() {
    let now = Utc::now();
    let mut far = input("api_request", "t1");
    far.timestamp = Some((now + Duration::hours(25)).fixed_offset());
    assert!(ParsedEvent::from_input(far, now, 24).is_err());
}

#[test]
fn test_charges_presummed_per_tenant_and_type() {
    let tenant_a = Uuid::new_v4();
    let tenant_b = Uuid::new_v4();
    let events = vec![
        parsed("a", "api_request", dec!(1)),
        parsed("a", "api_request", dec!(2)),
        parsed("a", "storage_gb", dec!(5)),
        parsed("b", "api_request", dec!(3)),
    ];
    let dispositions = vec![
        EventDisposition::Fresh {
            event_id: Uuid::new_v4(),
            tenant_id: tenant_a,
        },
        EventDisposition::Fresh {
            event_id: Uuid::new_v4(),
            tenant_id: tenant_a,
        },
        EventDisposition::Fresh {
            event_id: Uuid::new_v4(),
            tenant_id: tenant_a,
        },
        EventDisposition::Fresh {
            event_id: Uuid::new_v4(),
            tenant_id: tenant_b,
        },
    ];

    let charges = sum_charges(&events, &dispositions);
    assert_eq!(charges.len(), 3);

    let api_a = charges
        .iter()
        .find(|c| c.tenant_id == tenant_a && c.event_type == "api_request")
        .unwrap();
    assert_eq!(api_a.quantity, dec!(3));
}

#[test]
fn test_duplicates_do_not_consume_quota() {
    let tenant = Uuid::new_v4();
    let events = vec![
        parsed("a", "api_request", dec!(1)),
        parsed("a", "api_request", dec!(10)),
    ];
    let dispositions = vec![
        EventDisposition::Fresh {
            event_id: Uuid::new_v4(),
            tenant_id: tenant,
        },
        EventDisposition::Duplicate {
            event_id: Uuid::new_v4(),
        },
    ];

    let charges = sum_charges(&events, &dispositions);
    assert_eq!(charges.len(), 1);
    assert_eq!(charges[0].quantity, dec!(1));
}

#[test]
fn test_counter_aggregation_covers_hour_and_day() {
    let tenant = Uuid::new_v4();
    let now = Utc::now();
    let events = vec![parsed("a", "api_request", dec!(2))];
    let dispositions = vec![EventDisposition::Fresh {
        event_id: Uuid::new_v4(),
        tenant_id: tenant,
    }];

    let entries = counters::aggregate(&events, &dispositions, now);
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().any(|(key, _, _)| key.contains(":hour:")));
    assert!(entries.iter().any(|(key, _, _)| key.contains(":day:")));
    for (_, micros, _) in entries {
        assert_eq!(micros, 2_000_000);
    }
}

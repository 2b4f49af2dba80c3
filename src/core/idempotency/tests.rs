//! Idempotency filter tests

use super::filter::cache_key;
use uuid::Uuid;

#[test]
fn test_cache_key_scopes_by_organization() {
    let org_a = Uuid::new_v4();
    let org_b = Uuid::new_v4();
    assert_ne!(cache_key(org_a, "k1"), cache_key(org_b, "k1"));
}

#[test]
fn test_cache_key_format() {
    let org = Uuid::nil();
    assert_eq!(
        cache_key(org, "req-42"),
        format!("idempotency:{}:req-42", Uuid::nil())
    );
}

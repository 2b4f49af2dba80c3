//! Tenant resolver tests

#[test]
fn test_dedup_preserves_distinct_ids() {
    let ids = vec![
        "acme".to_string(),
        "globex".to_string(),
        "acme".to_string(),
        "initech".to_string(),
    ];
    let mut deduped = ids.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(deduped, vec!["acme", "globex", "initech"]);
}

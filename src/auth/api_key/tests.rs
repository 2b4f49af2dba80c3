//! API key module tests

use super::permissions;
use super::types::{permissions_contain, AuthContext};
use uuid::Uuid;

fn context_with(perms: &[&str]) -> AuthContext {
    AuthContext {
        organization_id: Uuid::new_v4(),
        api_key_id: Uuid::new_v4(),
        permissions: perms.iter().map(|p| p.to_string()).collect(),
    }
}

#[test]
fn test_permission_membership() {
    let ctx = context_with(&[permissions::EVENTS_WRITE]);
    assert!(ctx.has_permission(permissions::EVENTS_WRITE));
    assert!(!ctx.has_permission(permissions::USAGE_READ));
}

#[test]
fn test_permission_check_is_case_sensitive() {
    let ctx = context_with(&["events:write"]);
    assert!(!ctx.has_permission("EVENTS:WRITE"));
    assert!(!ctx.has_permission("Events:Write"));
}

#[test]
fn test_no_permission_hierarchy() {
    // Holding events:write grants nothing else.
    let set = vec!["events:write".to_string()];
    assert!(!permissions_contain(&set, "events"));
    assert!(!permissions_contain(&set, "events:read"));
    assert!(!permissions_contain(&set, "usage:read"));
}

#[test]
fn test_known_permissions() {
    assert!(permissions::is_known("events:write"));
    assert!(permissions::is_known("usage:read"));
    assert!(!permissions::is_known("admin:*"));
}

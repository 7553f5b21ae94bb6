//! Property tests for rule precedence

use proptest::prelude::*;
use ward_authorization::{ActionFlags, MatchKind, PermissionRule, Role, RoleAuthorizer};
use ward_core::{Action, JsonMap};

fn action() -> impl Strategy<Value = Action> {
    prop::sample::select(Action::ALL.to_vec())
}

proptest! {
    #[test]
    fn empty_role_denies(uri in "[a-z0-9._]{0,24}", action in action()) {
        let role = Role::new("empty", vec![]).unwrap();
        prop_assert!(!role.authorize(None, &uri, action, &JsonMap::new()).allow);
    }

    #[test]
    fn legacy_star_allows(uri in "[a-z0-9._]{0,24}", action in action()) {
        let role = Role::new("all", vec![PermissionRule::legacy("*", ActionFlags::all())]).unwrap();
        prop_assert!(role.authorize(None, &uri, action, &JsonMap::new()).allow);
    }

    #[test]
    fn exact_rule_shadows_broader_rules(
        segments in prop::collection::vec("[a-z]{1,6}", 1..5),
        action in action(),
    ) {
        let uri = segments.join(".");
        let wildcard = vec![""; segments.len()].join(".");
        let role = Role::new(
            "r",
            vec![
                PermissionRule::new("", MatchKind::Prefix, ActionFlags::all()),
                PermissionRule::new(wildcard, MatchKind::Wildcard, ActionFlags::all()),
                PermissionRule::new(uri.clone(), MatchKind::Exact, ActionFlags::default()),
            ],
        )
        .unwrap();
        prop_assert!(!role.authorize(None, &uri, action, &JsonMap::new()).allow);
    }

    #[test]
    fn wildcard_requires_equal_segment_counts(
        segments in prop::collection::vec("[a-z]{1,6}", 1..5),
        extra in "[a-z]{1,6}",
    ) {
        let pattern = vec![""; segments.len()].join(".");
        let rule = PermissionRule::new(pattern, MatchKind::Wildcard, ActionFlags::all());
        let uri = segments.join(".");
        prop_assert!(rule.matches(&uri));
        let longer = format!("{uri}.{extra}");
        prop_assert!(!rule.matches(&longer));
    }
}

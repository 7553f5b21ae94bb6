//! Roles and rule evaluation

use crate::decision::Authorization;
use crate::permission::{MatchKind, PermissionConfig, PermissionRule};
use std::fmt;
use ward_core::{Action, ConfigValidator, JsonMap, SessionContext, WardError};

/// Anything that can answer an authorization question for a bound session
///
/// The session layer holds one of these per authenticated session (usually as
/// `Arc<dyn RoleAuthorizer>`) and consults it for every call, register,
/// publish and subscribe.
pub trait RoleAuthorizer: fmt::Debug + Send + Sync {
    /// Role name
    fn name(&self) -> &str;

    /// Decide whether `action` on `uri` is permitted
    fn authorize(
        &self,
        session: Option<&SessionContext>,
        uri: &str,
        action: Action,
        options: &JsonMap,
    ) -> Authorization;
}

/// A named, immutable, ordered set of permission rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    name: String,
    rules: Vec<PermissionRule>,
}

impl Role {
    /// Build a role from already-constructed rules
    pub fn new(name: impl Into<String>, rules: Vec<PermissionRule>) -> Result<Self, WardError> {
        let name = name.into();
        let mut validator = ConfigValidator::new();
        validator.non_empty("name", &name);
        validator.result()?;
        Ok(Self { name, rules })
    }

    /// Build a role from a JSON array of permission rules
    pub fn from_config(name: impl Into<String>, permissions: &serde_json::Value) -> Result<Self, WardError> {
        let configs: Vec<PermissionConfig> = serde_json::from_value(permissions.clone())?;
        let rules = configs
            .into_iter()
            .map(PermissionRule::from_config)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(name, rules)
    }

    /// Rules in configured order
    pub fn rules(&self) -> &[PermissionRule] {
        &self.rules
    }

    /// The rule that decides for `uri`, if any
    ///
    /// Scans in configured order and keeps the first match of the best kind
    /// seen so far; an exact match ends the scan since nothing outranks it.
    pub fn matching_rule(&self, uri: &str) -> Option<&PermissionRule> {
        let mut best: Option<&PermissionRule> = None;
        for rule in self.rules.iter().filter(|rule| rule.matches(uri)) {
            let better = best.map_or(true, |current| {
                rule.match_kind().precedence() > current.match_kind().precedence()
            });
            if better {
                best = Some(rule);
                if rule.match_kind() == MatchKind::Exact {
                    break;
                }
            }
        }
        best
    }
}

impl RoleAuthorizer for Role {
    fn name(&self) -> &str {
        &self.name
    }

    fn authorize(
        &self,
        session: Option<&SessionContext>,
        uri: &str,
        action: Action,
        _options: &JsonMap,
    ) -> Authorization {
        let decision = match self.matching_rule(uri) {
            Some(rule) => Authorization {
                allow: rule.allow().allows(action),
                disclose: rule.disclose().applies_to(action),
                cache: rule.cache(),
            },
            None => Authorization::deny(),
        };

        tracing::trace!(
            role = %self.name,
            session_id = ?session.map(|s| s.session_id),
            uri = %uri,
            action = %action,
            allow = decision.allow,
            "authorization evaluated"
        );

        decision
    }
}

/// Built-in role for router-internal sessions: everything is allowed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedRole {
    name: String,
}

impl TrustedRole {
    /// Name the router gives its own internal sessions
    pub const DEFAULT_NAME: &'static str = "trusted";

    /// Create a trusted role with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for TrustedRole {
    fn default() -> Self {
        Self::new(Self::DEFAULT_NAME)
    }
}

impl RoleAuthorizer for TrustedRole {
    fn name(&self) -> &str {
        &self.name
    }

    fn authorize(
        &self,
        _session: Option<&SessionContext>,
        _uri: &str,
        _action: Action,
        _options: &JsonMap,
    ) -> Authorization {
        Authorization {
            allow: true,
            disclose: true,
            cache: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permission::ActionFlags;
    use serde_json::json;

    fn check(role: &Role, uri: &str, action: Action) -> bool {
        role.authorize(None, uri, action, &JsonMap::new()).allow
    }

    #[test]
    fn test_empty_name_is_rejected() {
        assert!(Role::new("", vec![]).is_err());
    }

    #[test]
    fn test_first_rule_wins_within_a_tier() {
        let role = Role::new(
            "r",
            vec![
                PermissionRule::new("com.", MatchKind::Prefix, ActionFlags::default()),
                PermissionRule::new("com.example.", MatchKind::Prefix, ActionFlags::all()),
            ],
        )
        .unwrap();
        // configured order decides between two prefix rules, not prefix length
        assert!(!check(&role, "com.example.add", Action::Call));
    }

    #[test]
    fn test_winning_deny_is_final() {
        let role = Role::new(
            "r",
            vec![
                PermissionRule::new("", MatchKind::Prefix, ActionFlags::all()),
                PermissionRule::new("com.secret", MatchKind::Exact, ActionFlags::default()),
            ],
        )
        .unwrap();
        assert!(!check(&role, "com.secret", Action::Subscribe));
        assert!(check(&role, "com.public", Action::Subscribe));
    }

    #[test]
    fn test_disclose_and_cache_come_from_winning_rule() {
        let role = Role::from_config(
            "r",
            &json!([
                {"uri": "com.", "match": "prefix", "allow": {"call": true, "publish": true},
                 "disclose": {"caller": true}, "cache": true}
            ]),
        )
        .unwrap();
        let call = role.authorize(None, "com.x", Action::Call, &JsonMap::new());
        assert_eq!(
            call,
            Authorization {
                allow: true,
                disclose: true,
                cache: true
            }
        );
        let publish = role.authorize(None, "com.x", Action::Publish, &JsonMap::new());
        assert!(publish.allow);
        assert!(!publish.disclose);

        let miss = role.authorize(None, "org.x", Action::Call, &JsonMap::new());
        assert_eq!(miss, Authorization::deny());
    }

    #[test]
    fn test_from_config_rejects_malformed_rules() {
        assert!(Role::from_config("r", &json!({"uri": "x"})).is_err());
        assert!(Role::from_config("r", &json!([{"allow": {}}])).is_err());
        assert!(Role::from_config("r", &json!([{"uri": "x", "allow": {"delete": true}}])).is_err());
    }

    #[test]
    fn test_trusted_role_allows_everything() {
        let role = TrustedRole::default();
        assert_eq!(role.name(), "trusted");
        for action in Action::ALL {
            let decision = role.authorize(None, "", action, &JsonMap::new());
            assert!(decision.allow);
            assert!(decision.disclose);
        }
    }
}

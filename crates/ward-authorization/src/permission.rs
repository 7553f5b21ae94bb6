//! Permission rules and URI matching

use serde::{Deserialize, Serialize};
use ward_core::{Action, ConfigValidation, ConfigValidator, WardError};

/// How a rule's pattern is compared against a URI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    /// Character-for-character equality
    Exact,
    /// Literal string prefix
    Prefix,
    /// Dot-segmented; empty pattern segments match any one URI segment
    Wildcard,
}

impl MatchKind {
    /// Precedence rank; higher wins
    pub fn precedence(&self) -> u8 {
        match self {
            MatchKind::Exact => 2,
            MatchKind::Wildcard => 1,
            MatchKind::Prefix => 0,
        }
    }
}

/// Per-action allow flags; absent actions are denied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ActionFlags {
    /// Calling procedures
    pub call: bool,
    /// Registering procedures
    pub register: bool,
    /// Publishing events
    pub publish: bool,
    /// Subscribing to topics
    pub subscribe: bool,
}

impl ActionFlags {
    /// Flags with every action allowed
    pub fn all() -> Self {
        Self {
            call: true,
            register: true,
            publish: true,
            subscribe: true,
        }
    }

    /// Whether `action` is allowed
    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::Call => self.call,
            Action::Register => self.register,
            Action::Publish => self.publish,
            Action::Subscribe => self.subscribe,
        }
    }
}

/// Identity disclosure flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiscloseFlags {
    /// Disclose the caller to the callee on `call`
    pub caller: bool,
    /// Disclose the publisher to subscribers on `publish`
    pub publisher: bool,
}

impl DiscloseFlags {
    /// Whether identity is disclosed for `action`
    pub fn applies_to(&self, action: Action) -> bool {
        match action {
            Action::Call => self.caller,
            Action::Publish => self.publisher,
            Action::Register | Action::Subscribe => false,
        }
    }
}

/// Permission rule as written in configuration
///
/// `match` may be omitted, in which case the legacy `*` syntax applies:
/// `"*"` matches everything, a trailing `*` makes a prefix rule, anything
/// else is exact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PermissionConfig {
    /// URI pattern
    pub uri: String,
    /// How `uri` is matched; legacy `*` syntax when absent
    #[serde(default, rename = "match", skip_serializing_if = "Option::is_none")]
    pub match_kind: Option<MatchKind>,
    /// Actions this rule allows
    #[serde(default)]
    pub allow: ActionFlags,
    /// Identity disclosure for matching actions
    #[serde(default)]
    pub disclose: DiscloseFlags,
    /// Whether the router may cache the decision
    #[serde(default)]
    pub cache: bool,
}

impl ConfigValidation for PermissionConfig {
    fn validate(&self) -> Result<(), WardError> {
        let mut validator = ConfigValidator::new();
        if self.match_kind.is_some() {
            validator.excludes("uri", &self.uri, '*');
        } else {
            // legacy syntax allows a single trailing '*' only
            let body = self.uri.strip_suffix('*').unwrap_or(&self.uri);
            validator.excludes("uri", body, '*');
        }
        validator.result().map_err(WardError::from)
    }
}

/// One immutable authorization entry of a role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionRule {
    pattern: String,
    match_kind: MatchKind,
    legacy: bool,
    allow: ActionFlags,
    disclose: DiscloseFlags,
    cache: bool,
}

impl PermissionRule {
    /// Build a rule with an explicit match kind
    pub fn new(pattern: impl Into<String>, match_kind: MatchKind, allow: ActionFlags) -> Self {
        Self {
            pattern: pattern.into(),
            match_kind,
            legacy: false,
            allow,
            disclose: DiscloseFlags::default(),
            cache: false,
        }
    }

    /// Build a rule from the legacy `*` syntax
    pub fn legacy(uri: &str, allow: ActionFlags) -> Self {
        let (pattern, match_kind) = match uri.strip_suffix('*') {
            Some(prefix) => (prefix.to_string(), MatchKind::Prefix),
            None => (uri.to_string(), MatchKind::Exact),
        };
        Self {
            pattern,
            match_kind,
            legacy: true,
            allow,
            disclose: DiscloseFlags::default(),
            cache: false,
        }
    }

    /// Set identity disclosure flags
    pub fn with_disclose(mut self, disclose: DiscloseFlags) -> Self {
        self.disclose = disclose;
        self
    }

    /// Mark decisions from this rule as cacheable
    pub fn with_cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    /// Build a rule from configuration, validating it first
    pub fn from_config(config: PermissionConfig) -> Result<Self, WardError> {
        config.validate()?;
        let rule = match config.match_kind {
            Some(kind) => Self::new(config.uri, kind, config.allow),
            None => Self::legacy(&config.uri, config.allow),
        };
        Ok(rule.with_disclose(config.disclose).with_cache(config.cache))
    }

    /// Normalized pattern (legacy trailing `*` removed)
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Effective match kind
    pub fn match_kind(&self) -> MatchKind {
        self.match_kind
    }

    /// Whether the rule was written in legacy syntax
    pub fn is_legacy(&self) -> bool {
        self.legacy
    }

    /// Allow flags
    pub fn allow(&self) -> ActionFlags {
        self.allow
    }

    /// Disclosure flags
    pub fn disclose(&self) -> DiscloseFlags {
        self.disclose
    }

    /// Whether decisions from this rule may be cached
    pub fn cache(&self) -> bool {
        self.cache
    }

    /// Whether this rule's pattern matches `uri`
    pub fn matches(&self, uri: &str) -> bool {
        match self.match_kind {
            MatchKind::Exact => uri == self.pattern,
            MatchKind::Prefix => uri.starts_with(&self.pattern),
            MatchKind::Wildcard => wildcard_matches(&self.pattern, uri),
        }
    }
}

/// Segment-wise match where an empty pattern segment matches any single segment
fn wildcard_matches(pattern: &str, uri: &str) -> bool {
    let mut pattern_segments = pattern.split('.');
    let mut uri_segments = uri.split('.');
    loop {
        match (pattern_segments.next(), uri_segments.next()) {
            (None, None) => return true,
            (Some(p), Some(u)) if p.is_empty() || p == u => continue,
            _ => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(pattern: &str, kind: MatchKind) -> PermissionRule {
        PermissionRule::new(pattern, kind, ActionFlags::all())
    }

    #[test]
    fn test_exact_matching() {
        let r = rule("com.example.add", MatchKind::Exact);
        assert!(r.matches("com.example.add"));
        assert!(!r.matches("com.example.add2"));
        assert!(!r.matches("com.example"));
    }

    #[test]
    fn test_prefix_matching() {
        let r = rule("com.example.", MatchKind::Prefix);
        assert!(r.matches("com.example.add"));
        assert!(r.matches("com.example."));
        assert!(!r.matches("com.example"));
        assert!(!r.matches("com.examples.add"));
    }

    #[test]
    fn test_wildcard_matching() {
        let r = rule("com..private", MatchKind::Wildcard);
        assert!(r.matches("com.foo.private"));
        assert!(r.matches("com..private"));
        assert!(!r.matches("com.foo.bar.private"));
        assert!(!r.matches("com.private"));
        assert!(!r.matches("org.foo.private"));

        let all_three = rule("..", MatchKind::Wildcard);
        assert!(all_three.matches("a.b.c"));
        assert!(!all_three.matches("a.b"));
    }

    #[test]
    fn test_legacy_normalization() {
        let star = PermissionRule::legacy("*", ActionFlags::all());
        assert_eq!(star.match_kind(), MatchKind::Prefix);
        assert_eq!(star.pattern(), "");
        assert!(star.matches(""));
        assert!(star.matches("anything.at.all"));

        let prefix = PermissionRule::legacy("com.example.*", ActionFlags::all());
        assert_eq!(prefix.match_kind(), MatchKind::Prefix);
        assert!(prefix.matches("com.example.1"));
        assert!(!prefix.matches("com.example"));

        let exact = PermissionRule::legacy("com.example", ActionFlags::all());
        assert_eq!(exact.match_kind(), MatchKind::Exact);
        assert!(exact.is_legacy());
    }

    #[test]
    fn test_absent_actions_default_to_deny() {
        let config: PermissionConfig =
            serde_json::from_value(serde_json::json!({"uri": "a", "allow": {"call": true}}))
                .unwrap();
        let r = PermissionRule::from_config(config).unwrap();
        assert!(r.allow().allows(Action::Call));
        assert!(!r.allow().allows(Action::Register));
        assert!(!r.allow().allows(Action::Publish));
        assert!(!r.allow().allows(Action::Subscribe));
    }

    #[test]
    fn test_config_rejects_star_in_explicit_patterns() {
        let config: PermissionConfig = serde_json::from_value(
            serde_json::json!({"uri": "com.*", "match": "prefix", "allow": {}}),
        )
        .unwrap();
        assert!(PermissionRule::from_config(config).is_err());

        let config: PermissionConfig =
            serde_json::from_value(serde_json::json!({"uri": "com.*.x*", "allow": {}})).unwrap();
        assert!(PermissionRule::from_config(config).is_err());
    }

    #[test]
    fn test_config_rejects_unknown_match_kind() {
        let parsed = serde_json::from_value::<PermissionConfig>(
            serde_json::json!({"uri": "com.", "match": "regex", "allow": {}}),
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn test_disclose_flags() {
        let disclose = DiscloseFlags {
            caller: true,
            publisher: false,
        };
        assert!(disclose.applies_to(Action::Call));
        assert!(!disclose.applies_to(Action::Publish));
        assert!(!disclose.applies_to(Action::Register));
    }
}

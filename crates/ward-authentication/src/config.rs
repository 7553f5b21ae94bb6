//! Authentication method configuration
//!
//! Every method is configured as either
//!
//! ```json
//! {"type": "static", ...method credentials...}
//! {"type": "dynamic", "authenticator": "com.example.authenticate", "timeout_ms": 5000}
//! ```
//!
//! Structure is checked when the handshake is constructed. Credential
//! material (hex keys, fingerprints) is only inspected during the handshake,
//! where a malformed value denies that one client instead of failing the realm.

use crate::crypto::{MAX_ITERATIONS, MAX_KEYLEN};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use ward_core::{ConfigValidation, ConfigValidator, JsonMap, WardError};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// String that is wiped on drop and never printed
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct SecretString(String);

impl SecretString {
    /// Wrap a secret
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Raw bytes, for comparison and key derivation only
    pub fn expose(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// The secret as text
    pub fn expose_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretString([redacted])")
    }
}

/// Static or dynamic credential source for one method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AuthConfig<S> {
    /// Credentials come from configuration
    Static(S),
    /// Credentials come from a remote authenticator
    Dynamic(DynamicConfig),
}

impl<S> AuthConfig<S>
where
    S: for<'de> Deserialize<'de> + ConfigValidation,
{
    /// Parse and validate a method configuration mapping
    pub fn from_value(value: &serde_json::Value) -> Result<Self, WardError> {
        let config: Self = serde_json::from_value(value.clone())?;
        config.validate()?;
        Ok(config)
    }
}

impl<S: ConfigValidation> ConfigValidation for AuthConfig<S> {
    fn validate(&self) -> Result<(), WardError> {
        match self {
            AuthConfig::Static(config) => config.validate(),
            AuthConfig::Dynamic(config) => config.validate(),
        }
    }
}

/// Remote authenticator settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicConfig {
    /// Procedure called once per decision point
    pub authenticator: String,

    /// Upper bound on one authenticator call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl DynamicConfig {
    /// Configured call timeout
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

impl ConfigValidation for DynamicConfig {
    fn validate(&self) -> Result<(), WardError> {
        let mut validator = ConfigValidator::new();
        validator
            .non_empty("authenticator", &self.authenticator)
            .custom("timeout_ms", &self.timeout_ms, |t| *t != Some(0), "must be positive");
        validator.result().map_err(WardError::from)
    }
}

fn default_anonymous_role() -> String {
    "anonymous".to_string()
}

/// Static anonymous configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnonymousConfig {
    /// Role every anonymous session gets
    #[serde(default = "default_anonymous_role")]
    pub role: String,

    /// Fixed authid; a random serial is generated when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authid: Option<String>,
}

impl Default for AnonymousConfig {
    fn default() -> Self {
        Self {
            role: default_anonymous_role(),
            authid: None,
        }
    }
}

impl ConfigValidation for AnonymousConfig {
    fn validate(&self) -> Result<(), WardError> {
        let mut validator = ConfigValidator::new();
        validator.non_empty("role", &self.role);
        validator.result().map_err(WardError::from)
    }
}

/// One ticket principal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketPrincipal {
    /// Shared secret the client presents
    pub ticket: SecretString,
    /// Role assigned on success
    pub role: String,
    /// Becomes the session's authextra
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<JsonMap>,
}

/// Static ticket configuration, keyed by authid
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketConfig {
    /// Principals by authid
    #[serde(default)]
    pub principals: BTreeMap<String, TicketPrincipal>,
}

impl ConfigValidation for TicketConfig {
    fn validate(&self) -> Result<(), WardError> {
        let root = ConfigValidator::new();
        let mut validator = ConfigValidator::new();
        for (authid, principal) in &self.principals {
            let mut entry = root.for_field(&format!("principals.{authid}"));
            entry.non_empty("role", &principal.role);
            validator.merge(entry);
        }
        validator.result().map_err(WardError::from)
    }
}

/// One WAMP-CRA user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WampCraUser {
    /// Shared secret
    pub secret: SecretString,
    /// Role assigned on success
    pub role: String,
    /// When present, the HMAC key is PBKDF2-derived from the secret
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
    /// PBKDF2 iterations, `DEFAULT_ITERATIONS` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iterations: Option<u32>,
    /// Derived key length in bytes, `DEFAULT_KEYLEN` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keylen: Option<u32>,
    /// Becomes the session's authextra
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<JsonMap>,
}

/// Static WAMP-CRA configuration, keyed by authid
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WampCraConfig {
    /// Users by authid
    #[serde(default)]
    pub users: BTreeMap<String, WampCraUser>,
}

impl ConfigValidation for WampCraConfig {
    fn validate(&self) -> Result<(), WardError> {
        let root = ConfigValidator::new();
        let mut validator = ConfigValidator::new();
        for (authid, user) in &self.users {
            let mut entry = root.for_field(&format!("users.{authid}"));
            entry
                .non_empty("role", &user.role)
                .custom(
                    "iterations",
                    &user.iterations,
                    |i| i.map_or(true, |i| (1..=MAX_ITERATIONS).contains(&i)),
                    &format!("must be between 1 and {MAX_ITERATIONS}"),
                )
                .custom(
                    "keylen",
                    &user.keylen,
                    |k| k.map_or(true, |k| (1..=MAX_KEYLEN).contains(&k)),
                    &format!("must be between 1 and {MAX_KEYLEN}"),
                );
            validator.merge(entry);
        }
        validator.result().map_err(WardError::from)
    }
}

/// One cryptosign principal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptosignPrincipal {
    /// Hex-encoded Ed25519 public keys allowed to act as this principal
    pub authorized_keys: Vec<String>,
    /// Role assigned on success
    pub role: String,
    /// Becomes the session's authextra
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<JsonMap>,
}

/// Static cryptosign configuration, keyed by authid
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptosignConfig {
    /// Principals by authid
    #[serde(default)]
    pub principals: BTreeMap<String, CryptosignPrincipal>,
}

impl ConfigValidation for CryptosignConfig {
    fn validate(&self) -> Result<(), WardError> {
        let root = ConfigValidator::new();
        let mut validator = ConfigValidator::new();
        for (authid, principal) in &self.principals {
            let mut entry = root.for_field(&format!("principals.{authid}"));
            entry.non_empty("role", &principal.role).custom(
                "authorized_keys",
                &principal.authorized_keys,
                |keys| !keys.is_empty(),
                "at least one key is required",
            );
            validator.merge(entry);
        }
        validator.result().map_err(WardError::from)
    }
}

/// One TLS principal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsPrincipal {
    /// SHA-1 fingerprint of the client certificate, hex with optional `:`
    pub certificate_sha1: String,
    /// Role assigned on success
    pub role: String,
    /// Becomes the session's authextra
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<JsonMap>,
}

/// Static TLS configuration, keyed by authid
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsConfig {
    /// Principals by authid
    #[serde(default)]
    pub principals: BTreeMap<String, TlsPrincipal>,
}

impl ConfigValidation for TlsConfig {
    fn validate(&self) -> Result<(), WardError> {
        let root = ConfigValidator::new();
        let mut validator = ConfigValidator::new();
        for (authid, principal) in &self.principals {
            let mut entry = root.for_field(&format!("principals.{authid}"));
            entry
                .non_empty("role", &principal.role)
                .non_empty("certificate_sha1", &principal.certificate_sha1);
            validator.merge(entry);
        }
        validator.result().map_err(WardError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dynamic_config_parses() {
        let config: AuthConfig<TicketConfig> = AuthConfig::from_value(&json!({
            "type": "dynamic",
            "authenticator": "com.example.auth",
            "timeout_ms": 1500
        }))
        .unwrap();
        match config {
            AuthConfig::Dynamic(dynamic) => {
                assert_eq!(dynamic.authenticator, "com.example.auth");
                assert_eq!(dynamic.timeout(), Some(Duration::from_millis(1500)));
            }
            AuthConfig::Static(_) => panic!("expected dynamic config"),
        }
    }

    #[test]
    fn test_anonymous_defaults() {
        let config: AuthConfig<AnonymousConfig> =
            AuthConfig::from_value(&json!({"type": "static"})).unwrap();
        assert_eq!(config, AuthConfig::Static(AnonymousConfig::default()));
    }

    #[test]
    fn test_missing_or_unknown_type_is_rejected() {
        assert!(AuthConfig::<AnonymousConfig>::from_value(&json!({"role": "x"})).is_err());
        assert!(AuthConfig::<AnonymousConfig>::from_value(&json!({"type": "ldap"})).is_err());
    }

    #[test]
    fn test_empty_authenticator_is_rejected() {
        let err = AuthConfig::<TicketConfig>::from_value(&json!({
            "type": "dynamic",
            "authenticator": ""
        }))
        .unwrap_err();
        assert!(err.to_string().contains("authenticator"));
    }

    #[test]
    fn test_wampcra_rejects_zero_iterations() {
        let err = AuthConfig::<WampCraConfig>::from_value(&json!({
            "type": "static",
            "users": {"joe": {"secret": "s", "role": "user", "salt": "x", "iterations": 0}}
        }))
        .unwrap_err();
        assert!(err.to_string().contains("users.joe.iterations"));
    }

    #[test]
    fn test_wampcra_rejects_oversized_key_derivation() {
        let err = AuthConfig::<WampCraConfig>::from_value(&json!({
            "type": "static",
            "users": {"joe": {"secret": "s", "role": "user", "salt": "x", "iterations": 4000000000u64}}
        }))
        .unwrap_err();
        assert!(matches!(err, WardError::Invalid { .. }));
        assert!(err.to_string().contains("users.joe.iterations"));

        let err = AuthConfig::<WampCraConfig>::from_value(&json!({
            "type": "static",
            "users": {"joe": {"secret": "s", "role": "user", "salt": "x", "keylen": 4096}}
        }))
        .unwrap_err();
        assert!(err.to_string().contains("users.joe.keylen"));

        assert!(AuthConfig::<WampCraConfig>::from_value(&json!({
            "type": "static",
            "users": {"joe": {"secret": "s", "role": "user", "salt": "x",
                              "iterations": MAX_ITERATIONS, "keylen": MAX_KEYLEN}}
        }))
        .is_ok());
    }

    #[test]
    fn test_secrets_are_redacted_in_debug_output() {
        let config: AuthConfig<TicketConfig> = AuthConfig::from_value(&json!({
            "type": "static",
            "principals": {"joe": {"ticket": "hunter2", "role": "user"}}
        }))
        .unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("redacted"));
    }
}

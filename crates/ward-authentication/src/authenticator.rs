//! Dynamic authenticator client
//!
//! Issues exactly one remote call per decision point:
//!
//! ```text
//! <authenticator>(realm, authid | null, {authmethod, authextra, session, transport_info, ...})
//! ```
//!
//! and normalizes whatever comes back into an `AuthenticatorResponse`. There
//! is no retry: the remote side may not be idempotent, and the client is not
//! around to re-prove anything.

use crate::config::{DynamicConfig, SecretString};
use crate::crypto::{MAX_ITERATIONS, MAX_KEYLEN};
use crate::errors::AuthenticationError;
use crate::outcome::HelloDetails;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use ward_core::{AuthMethod, JsonMap, RemoteCallEffects, SessionContext};

/// PBKDF2 parameters a WAMP-CRA authenticator may return with the secret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDerivation {
    /// PBKDF2 salt
    pub salt: String,
    /// Iteration count, at most `MAX_ITERATIONS`
    pub iterations: Option<u32>,
    /// Derived key length in bytes, at most `MAX_KEYLEN`
    pub keylen: Option<u32>,
}

/// Method-agnostic view of an authenticator's answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatorResponse {
    /// `secret` (wampcra) or `pubkey` (cryptosign); absent for other methods
    pub credential: Option<SecretString>,
    /// Role to assign
    pub role: String,
    /// Overrides the authid the client claimed
    pub authid: Option<String>,
    /// Becomes the session's authextra
    pub extra: Option<JsonMap>,
    /// Salting parameters for wampcra secrets
    pub key_derivation: Option<KeyDerivation>,
}

impl AuthenticatorResponse {
    /// Normalize a raw authenticator result for `method`
    pub fn from_value(method: AuthMethod, value: Value) -> Result<Self, AuthenticationError> {
        let map = match value {
            Value::Object(map) => map,
            Value::String(role) if Self::accepts_bare_role(method) => {
                return Self::role_only(role);
            }
            _ => {
                return Err(AuthenticationError::invalid(
                    "authenticator must return a mapping",
                ))
            }
        };

        let role = match map.get("role") {
            Some(Value::String(role)) if !role.is_empty() => role.clone(),
            _ => {
                return Err(AuthenticationError::invalid(
                    "authenticator response lacks a role",
                ))
            }
        };

        let credential_key = match method {
            AuthMethod::WampCra => Some("secret"),
            AuthMethod::Cryptosign => Some("pubkey"),
            AuthMethod::Anonymous | AuthMethod::Ticket | AuthMethod::Tls => None,
        };
        let credential = match credential_key {
            Some(key) => optional_str(&map, key)?.map(SecretString::new),
            None => None,
        };

        let extra = match map.get("extra") {
            None | Some(Value::Null) => None,
            Some(Value::Object(extra)) => Some(extra.clone()),
            Some(_) => {
                return Err(AuthenticationError::invalid(
                    "authenticator extra must be a mapping",
                ))
            }
        };

        let key_derivation = match (method, optional_str(&map, "salt")?) {
            (AuthMethod::WampCra, Some(salt)) => Some(KeyDerivation {
                salt,
                iterations: bounded_u32(&map, "iterations", MAX_ITERATIONS)?,
                keylen: bounded_u32(&map, "keylen", MAX_KEYLEN)?,
            }),
            _ => None,
        };

        Ok(Self {
            credential,
            role,
            authid: optional_str(&map, "authid")?,
            extra,
            key_derivation,
        })
    }

    fn accepts_bare_role(method: AuthMethod) -> bool {
        matches!(
            method,
            AuthMethod::Anonymous | AuthMethod::Ticket | AuthMethod::Tls
        )
    }

    fn role_only(role: String) -> Result<Self, AuthenticationError> {
        if role.is_empty() {
            return Err(AuthenticationError::invalid(
                "authenticator returned an empty role",
            ));
        }
        Ok(Self {
            credential: None,
            role,
            authid: None,
            extra: None,
            key_derivation: None,
        })
    }
}

fn optional_str(map: &JsonMap, key: &str) -> Result<Option<String>, AuthenticationError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(AuthenticationError::invalid(format!(
            "authenticator field '{key}' must be a string"
        ))),
    }
}

fn bounded_u32(map: &JsonMap, key: &str, max: u32) -> Result<Option<u32>, AuthenticationError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .filter(|n| (1..=max).contains(n))
            .map(Some)
            .ok_or_else(|| {
                AuthenticationError::invalid(format!(
                    "authenticator field '{key}' must be an integer between 1 and {max}"
                ))
            }),
    }
}

/// Build the `details` argument for an authenticator call
pub fn request_details(
    method: AuthMethod,
    session: &SessionContext,
    hello: &HelloDetails,
) -> JsonMap {
    let mut details = JsonMap::new();
    details.insert("authmethod".into(), Value::from(method.as_str()));
    details.insert(
        "authextra".into(),
        hello
            .authextra
            .clone()
            .map(Value::Object)
            .unwrap_or(Value::Null),
    );
    details.insert("session".into(), Value::from(session.session_id.value()));
    details.insert(
        "transport_info".into(),
        Value::Object(session.transport_info.clone()),
    );
    details
}

/// Client for a configured remote authenticator procedure
#[derive(Clone)]
pub struct DynamicAuthenticator {
    procedure: String,
    timeout: Option<Duration>,
    remote: Arc<dyn RemoteCallEffects>,
}

impl fmt::Debug for DynamicAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicAuthenticator")
            .field("procedure", &self.procedure)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl DynamicAuthenticator {
    /// Bind a configuration to the remote call capability
    pub fn new(config: &DynamicConfig, remote: Arc<dyn RemoteCallEffects>) -> Self {
        Self {
            procedure: config.authenticator.clone(),
            timeout: config.timeout(),
            remote,
        }
    }

    /// Ask the authenticator about `authid` in `realm`
    pub async fn resolve(
        &self,
        method: AuthMethod,
        realm: &str,
        authid: Option<&str>,
        details: JsonMap,
    ) -> Result<AuthenticatorResponse, AuthenticationError> {
        let args = vec![
            Value::from(realm),
            authid.map_or(Value::Null, Value::from),
            Value::Object(details),
        ];

        tracing::debug!(
            procedure = %self.procedure,
            authmethod = %method,
            realm = %realm,
            "calling dynamic authenticator"
        );

        let call = self.remote.call(&self.procedure, args);
        let outcome = match self.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, call).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    return Err(AuthenticationError::unavailable(format!(
                        "{} timed out after {}ms",
                        self.procedure,
                        timeout.as_millis()
                    )))
                }
            },
            None => call.await,
        };

        let value = outcome.map_err(|e| {
            AuthenticationError::unavailable(format!("{} failed: {e}", self.procedure))
        })?;
        AuthenticatorResponse::from_value(method, value)
    }
}

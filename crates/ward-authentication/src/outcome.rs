//! Handshake inputs and outcomes

use crate::errors::AuthenticationError;
use serde::{Deserialize, Serialize};
use ward_core::{AuthMethod, JsonMap};

/// What the client said about itself in HELLO
///
/// Transport metadata is not repeated here; it travels with the
/// `SessionContext` the handshake was created for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HelloDetails {
    /// Claimed identity, if any
    #[serde(default)]
    pub authid: Option<String>,

    /// Client-supplied extra mapping, forwarded verbatim to authenticators
    #[serde(default)]
    pub authextra: Option<JsonMap>,
}

impl HelloDetails {
    /// HELLO claiming `authid`
    pub fn with_authid(authid: impl Into<String>) -> Self {
        Self {
            authid: Some(authid.into()),
            authextra: None,
        }
    }

    /// Attach an authextra mapping
    pub fn authextra(mut self, authextra: JsonMap) -> Self {
        self.authextra = Some(authextra);
        self
    }

    /// String value of `authextra[key]`, distinguishing absent from mistyped
    pub(crate) fn authextra_str(&self, key: &str) -> Result<Option<&str>, AuthenticationError> {
        match self.authextra.as_ref().and_then(|extra| extra.get(key)) {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(serde_json::Value::String(s)) => Ok(Some(s)),
            Some(_) => Err(AuthenticationError::invalid(format!(
                "authextra.{key} must be a string"
            ))),
        }
    }
}

/// Where the principal came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    /// Router configuration
    Static,
    /// Remote authenticator procedure
    Dynamic,
}

impl AuthProvider {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthProvider::Static => "static",
            AuthProvider::Dynamic => "dynamic",
        }
    }
}

/// More data is needed from the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    /// Method the challenge belongs to
    pub method: AuthMethod,
    /// Method-specific challenge data sent in CHALLENGE
    pub extra: JsonMap,
}

/// The handshake succeeded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Accept {
    /// Realm the session joins
    pub realm: String,
    /// Verified identity
    pub authid: String,
    /// Role to bind the session to
    pub authrole: String,
    /// Method that established the identity
    pub authmethod: AuthMethod,
    /// Where the principal came from
    pub authprovider: AuthProvider,
    /// Extra mapping from the identity source, never the client's own
    pub authextra: Option<JsonMap>,
}

/// The handshake failed; the session layer closes the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deny {
    /// Human-readable reason that reveals nothing about the credential
    pub reason: String,
}

impl Deny {
    /// Deny with `reason`
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Result of `hello` or `authenticate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "lowercase")]
pub enum AuthResult {
    /// Send CHALLENGE and wait for AUTHENTICATE
    Challenge(Challenge),
    /// Send WELCOME
    Accept(Accept),
    /// Send ABORT
    Deny(Deny),
}

impl AuthResult {
    /// Whether this is an `Accept`
    pub fn is_accept(&self) -> bool {
        matches!(self, AuthResult::Accept(_))
    }

    /// Whether this is a `Deny`
    pub fn is_deny(&self) -> bool {
        matches!(self, AuthResult::Deny(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_authextra_str() {
        let extra = json!({"pubkey": "abcd", "n": 1, "nothing": null});
        let hello = HelloDetails::default().authextra(extra.as_object().unwrap().clone());
        assert_eq!(hello.authextra_str("pubkey"), Ok(Some("abcd")));
        assert_eq!(hello.authextra_str("missing"), Ok(None));
        assert_eq!(hello.authextra_str("nothing"), Ok(None));
        assert_eq!(
            hello.authextra_str("n"),
            Err(AuthenticationError::InvalidCredentialFormat(
                "authextra.n must be a string".into()
            ))
        );
    }

    #[test]
    fn test_result_serialization_is_tagged() {
        let deny = AuthResult::Deny(Deny::new("authentication failed"));
        assert_eq!(
            serde_json::to_value(&deny).unwrap(),
            json!({"result": "deny", "reason": "authentication failed"})
        );
    }
}

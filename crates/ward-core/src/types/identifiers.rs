//! Core identifier types used across the auth core

use crate::WardError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Router-assigned session identifier
///
/// Sessions are numbered by the session layer; the auth core only carries the
/// value through to the remote authenticator and into log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl SessionId {
    /// Get the raw numeric value
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

impl From<u64> for SessionId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Credential method negotiated in the client's HELLO
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    /// No credential; role comes from configuration or the authenticator
    Anonymous,
    /// Shared ticket presented in AUTHENTICATE
    Ticket,
    /// WAMP challenge-response with an HMAC over a server challenge
    #[serde(rename = "wampcra")]
    WampCra,
    /// Ed25519 signature over a server nonce
    Cryptosign,
    /// Client certificate already verified by the transport
    Tls,
}

impl AuthMethod {
    /// All methods, in the order the router offers them
    pub const ALL: [AuthMethod; 5] = [
        AuthMethod::Anonymous,
        AuthMethod::Ticket,
        AuthMethod::WampCra,
        AuthMethod::Cryptosign,
        AuthMethod::Tls,
    ];

    /// Wire name of the method
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::Anonymous => "anonymous",
            AuthMethod::Ticket => "ticket",
            AuthMethod::WampCra => "wampcra",
            AuthMethod::Cryptosign => "cryptosign",
            AuthMethod::Tls => "tls",
        }
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthMethod {
    type Err = WardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AuthMethod::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| WardError::invalid(format!("unknown authentication method: {s}")))
    }
}

/// Action a session attempts on a URI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Invoke a registered procedure
    Call,
    /// Register a procedure
    Register,
    /// Publish to a topic
    Publish,
    /// Subscribe to a topic
    Subscribe,
}

impl Action {
    /// All actions covered by a permission rule
    pub const ALL: [Action; 4] = [
        Action::Call,
        Action::Register,
        Action::Publish,
        Action::Subscribe,
    ];

    /// Wire name of the action
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Call => "call",
            Action::Register => "register",
            Action::Publish => "publish",
            Action::Subscribe => "subscribe",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = WardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| WardError::invalid(format!("unknown action: {s}")))
    }
}

//! Pending authentication state machines
//!
//! ```text
//!         hello                 authenticate
//! NEW ───────────► CHALLENGE_SENT ───────────► AUTHENTICATED
//!  │                     │
//!  └─────────────────────┴───────────────────► DENIED
//! ```
//!
//! `anonymous` and `tls` go from NEW straight to a terminal state. A handshake
//! only ever moves forward: calling `hello` twice, or `authenticate` without an
//! outstanding challenge, is a `ProtocolViolation` and leaves the state alone.
//!
//! Each variant holds its credential source as `CredentialSource::Static` or
//! `CredentialSource::Dynamic`, so the state machine is the same for both.
//! The session is referenced weakly; after every delegated call the variant
//! checks it is still alive before touching any state.

mod anonymous;
mod cryptosign;
mod ticket;
mod tls;
mod wampcra;

pub use anonymous::PendingAuthAnonymous;
pub use cryptosign::PendingAuthCryptosign;
pub use ticket::PendingAuthTicket;
pub use tls::PendingAuthTls;
pub use wampcra::PendingAuthWampCra;

use crate::authenticator::DynamicAuthenticator;
use crate::config::AuthConfig;
use crate::errors::AuthenticationError;
use crate::outcome::{Accept, AuthProvider, AuthResult, Challenge, Deny, HelloDetails};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Weak};
use ward_core::{
    AuthMethod, ConfigValidation, JsonMap, PhysicalTimeEffects, RandomEffects, RemoteCallEffects,
    SessionContext, SessionId, WardError,
};

/// Capabilities a handshake is constructed with
#[derive(Clone)]
pub struct AuthEffects {
    /// Nonces, challenges and generated authids
    pub random: Arc<dyn RandomEffects>,
    /// Challenge timestamps
    pub time: Arc<dyn PhysicalTimeEffects>,
    /// Required when any method is configured as `dynamic`
    pub remote: Option<Arc<dyn RemoteCallEffects>>,
}

impl AuthEffects {
    /// Effects without a remote call capability (static methods only)
    pub fn new(random: Arc<dyn RandomEffects>, time: Arc<dyn PhysicalTimeEffects>) -> Self {
        Self {
            random,
            time,
            remote: None,
        }
    }

    /// Attach the remote call capability used by dynamic authenticators
    pub fn with_remote(mut self, remote: Arc<dyn RemoteCallEffects>) -> Self {
        self.remote = Some(remote);
        self
    }
}

impl fmt::Debug for AuthEffects {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthEffects")
            .field("remote", &self.remote.is_some())
            .finish_non_exhaustive()
    }
}

/// Handshake progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthState {
    /// Waiting for `hello`
    New,
    /// Waiting for `authenticate`
    ChallengeSent,
    /// Accepted (terminal)
    Authenticated,
    /// Denied (terminal)
    Denied,
}

impl AuthState {
    /// Whether no further operation is allowed
    pub fn is_terminal(&self) -> bool {
        matches!(self, AuthState::Authenticated | AuthState::Denied)
    }
}

/// Where a variant gets its credentials from
#[derive(Debug)]
pub(crate) enum CredentialSource<S> {
    Static(S),
    Dynamic(DynamicAuthenticator),
}

impl<S> CredentialSource<S>
where
    S: DeserializeOwned + ConfigValidation,
{
    pub(crate) fn from_config(
        method: AuthMethod,
        config: &serde_json::Value,
        effects: &AuthEffects,
    ) -> Result<Self, WardError> {
        match AuthConfig::<S>::from_value(config)? {
            AuthConfig::Static(config) => Ok(Self::Static(config)),
            AuthConfig::Dynamic(config) => {
                let remote = effects.remote.as_ref().ok_or_else(|| {
                    WardError::invalid(format!(
                        "{method} is configured as dynamic but no remote call capability is available"
                    ))
                })?;
                Ok(Self::Dynamic(DynamicAuthenticator::new(
                    &config,
                    Arc::clone(remote),
                )))
            }
        }
    }

    pub(crate) fn provider(&self) -> AuthProvider {
        match self {
            CredentialSource::Static(_) => AuthProvider::Static,
            CredentialSource::Dynamic(_) => AuthProvider::Dynamic,
        }
    }
}

/// A resolved principal, verified or awaiting proof
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Identity {
    pub(crate) authid: String,
    pub(crate) authrole: String,
    pub(crate) authextra: Option<JsonMap>,
}

/// State shared by every variant
#[derive(Debug)]
pub(crate) struct PendingAuthBase {
    method: AuthMethod,
    provider: AuthProvider,
    session_id: SessionId,
    session: Weak<SessionContext>,
    state: AuthState,
    realm: Option<String>,
    identity: Option<Identity>,
}

impl PendingAuthBase {
    pub(crate) fn new(
        method: AuthMethod,
        provider: AuthProvider,
        session: &Arc<SessionContext>,
    ) -> Self {
        Self {
            method,
            provider,
            session_id: session.session_id,
            session: Arc::downgrade(session),
            state: AuthState::New,
            realm: None,
            identity: None,
        }
    }

    pub(crate) fn state(&self) -> AuthState {
        self.state
    }

    pub(crate) fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub(crate) fn realm(&self) -> Result<&str, AuthenticationError> {
        self.realm
            .as_deref()
            .ok_or_else(|| AuthenticationError::protocol("no realm recorded"))
    }

    /// Live session handle; do not hold it across an await
    pub(crate) fn session(&self) -> Result<Arc<SessionContext>, AuthenticationError> {
        self.session
            .upgrade()
            .ok_or(AuthenticationError::SessionClosed)
    }

    pub(crate) fn ensure_session(&self) -> Result<(), AuthenticationError> {
        if self.session.strong_count() == 0 {
            return Err(AuthenticationError::SessionClosed);
        }
        Ok(())
    }

    pub(crate) fn begin_hello(&self) -> Result<(), AuthenticationError> {
        if self.state != AuthState::New {
            return Err(AuthenticationError::protocol(format!(
                "hello received in state {:?}",
                self.state
            )));
        }
        Ok(())
    }

    pub(crate) fn begin_authenticate(&self) -> Result<(), AuthenticationError> {
        if self.state != AuthState::ChallengeSent {
            return Err(AuthenticationError::protocol(format!(
                "authenticate received in state {:?}",
                self.state
            )));
        }
        Ok(())
    }

    /// Record a challenge; `identity` is what the response must prove, if known yet
    pub(crate) fn challenge(
        &mut self,
        realm: &str,
        identity: Option<Identity>,
        extra: JsonMap,
    ) -> AuthResult {
        tracing::debug!(
            session_id = %self.session_id,
            authmethod = %self.method,
            realm = %realm,
            "challenge issued"
        );
        self.realm = Some(realm.to_string());
        self.identity = identity;
        self.state = AuthState::ChallengeSent;
        AuthResult::Challenge(Challenge {
            method: self.method,
            extra,
        })
    }

    pub(crate) fn accept(&mut self, realm: &str, identity: Identity) -> AuthResult {
        tracing::debug!(
            session_id = %self.session_id,
            authmethod = %self.method,
            authprovider = self.provider.as_str(),
            realm = %realm,
            authid = %identity.authid,
            authrole = %identity.authrole,
            "authentication accepted"
        );
        let accept = Accept {
            realm: realm.to_string(),
            authid: identity.authid.clone(),
            authrole: identity.authrole.clone(),
            authmethod: self.method,
            authprovider: self.provider,
            authextra: identity.authextra.clone(),
        };
        self.realm = Some(realm.to_string());
        self.identity = Some(identity);
        self.state = AuthState::Authenticated;
        AuthResult::Accept(accept)
    }

    /// Accept the identity recorded when the challenge went out
    pub(crate) fn accept_challenged(&mut self) -> Result<AuthResult, AuthenticationError> {
        let realm = self.realm()?.to_string();
        let identity = self
            .identity
            .clone()
            .ok_or_else(|| AuthenticationError::protocol("no identity awaiting proof"))?;
        Ok(self.accept(&realm, identity))
    }

    /// Collapse an operation's outcome into the public result
    ///
    /// Only protocol violations escape as errors. Once the session is gone
    /// nothing is mutated and the caller gets a `session closed` deny.
    pub(crate) fn finish(
        &mut self,
        operation: &'static str,
        outcome: Result<AuthResult, AuthenticationError>,
    ) -> Result<AuthResult, AuthenticationError> {
        let error = match outcome {
            Ok(result) => return Ok(result),
            Err(error) => error,
        };

        if error.is_hard() {
            tracing::warn!(
                session_id = %self.session_id,
                authmethod = %self.method,
                operation,
                error = %error,
                "handshake protocol violation"
            );
            return Err(error);
        }

        if error == AuthenticationError::SessionClosed || self.session.strong_count() == 0 {
            tracing::debug!(
                session_id = %self.session_id,
                authmethod = %self.method,
                operation,
                "session closed during handshake"
            );
            return Ok(AuthResult::Deny(Deny::new(
                AuthenticationError::SessionClosed.deny_reason(),
            )));
        }

        match &error {
            AuthenticationError::VerificationFailed => tracing::debug!(
                session_id = %self.session_id,
                authmethod = %self.method,
                operation,
                "authentication denied"
            ),
            _ => tracing::warn!(
                session_id = %self.session_id,
                authmethod = %self.method,
                operation,
                error = %error,
                "authentication denied"
            ),
        }

        self.state = AuthState::Denied;
        self.identity = None;
        Ok(AuthResult::Deny(Deny::new(error.deny_reason())))
    }
}

/// Authid the client claimed, treating an empty string as absent
pub(crate) fn claimed_authid(details: &HelloDetails) -> Option<&str> {
    details.authid.as_deref().filter(|authid| !authid.is_empty())
}

/// A pending handshake for one of the five methods
#[derive(Debug)]
pub enum PendingAuth {
    /// No credentials
    Anonymous(PendingAuthAnonymous),
    /// Shared-secret ticket
    Ticket(PendingAuthTicket),
    /// HMAC challenge/response
    WampCra(PendingAuthWampCra),
    /// Ed25519 challenge/response
    Cryptosign(PendingAuthCryptosign),
    /// Client certificate verified by the transport
    Tls(PendingAuthTls),
}

impl PendingAuth {
    /// Create the handshake for `method` from its configuration mapping
    ///
    /// Structural configuration problems are reported here, before any
    /// client is involved.
    pub fn new(
        method: AuthMethod,
        session: &Arc<SessionContext>,
        config: &serde_json::Value,
        effects: &AuthEffects,
    ) -> Result<Self, WardError> {
        Ok(match method {
            AuthMethod::Anonymous => {
                PendingAuth::Anonymous(PendingAuthAnonymous::new(session, config, effects)?)
            }
            AuthMethod::Ticket => {
                PendingAuth::Ticket(PendingAuthTicket::new(session, config, effects)?)
            }
            AuthMethod::WampCra => {
                PendingAuth::WampCra(PendingAuthWampCra::new(session, config, effects)?)
            }
            AuthMethod::Cryptosign => {
                PendingAuth::Cryptosign(PendingAuthCryptosign::new(session, config, effects)?)
            }
            AuthMethod::Tls => PendingAuth::Tls(PendingAuthTls::new(session, config, effects)?),
        })
    }

    /// Handle the client's HELLO
    pub async fn hello(
        &mut self,
        realm: &str,
        details: &HelloDetails,
    ) -> Result<AuthResult, AuthenticationError> {
        match self {
            PendingAuth::Anonymous(pending) => pending.hello(realm, details).await,
            PendingAuth::Ticket(pending) => pending.hello(realm, details).await,
            PendingAuth::WampCra(pending) => pending.hello(realm, details).await,
            PendingAuth::Cryptosign(pending) => pending.hello(realm, details).await,
            PendingAuth::Tls(pending) => pending.hello(realm, details).await,
        }
    }

    /// Handle the client's AUTHENTICATE
    pub async fn authenticate(&mut self, signature: &str) -> Result<AuthResult, AuthenticationError> {
        match self {
            PendingAuth::Ticket(pending) => pending.authenticate(signature).await,
            PendingAuth::WampCra(pending) => pending.authenticate(signature).await,
            PendingAuth::Cryptosign(pending) => pending.authenticate(signature).await,
            PendingAuth::Anonymous(_) | PendingAuth::Tls(_) => {
                let error = AuthenticationError::protocol(format!(
                    "{} does not issue challenges",
                    self.method()
                ));
                tracing::warn!(
                    session_id = %self.base().session_id,
                    authmethod = %self.method(),
                    error = %error,
                    "handshake protocol violation"
                );
                Err(error)
            }
        }
    }

    /// Method this handshake implements
    pub fn method(&self) -> AuthMethod {
        self.base().method
    }

    /// Where the credentials come from
    pub fn provider(&self) -> AuthProvider {
        self.base().provider
    }

    /// Current state
    pub fn state(&self) -> AuthState {
        self.base().state()
    }

    /// Authid once one has been resolved
    pub fn authid(&self) -> Option<&str> {
        self.base().identity().map(|identity| identity.authid.as_str())
    }

    /// Role once one has been resolved
    pub fn authrole(&self) -> Option<&str> {
        self.base()
            .identity()
            .map(|identity| identity.authrole.as_str())
    }

    fn base(&self) -> &PendingAuthBase {
        match self {
            PendingAuth::Anonymous(pending) => &pending.base,
            PendingAuth::Ticket(pending) => &pending.base,
            PendingAuth::WampCra(pending) => &pending.base,
            PendingAuth::Cryptosign(pending) => &pending.base,
            PendingAuth::Tls(pending) => &pending.base,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Arc<SessionContext> {
        SessionContext::shared(1, JsonMap::new())
    }

    fn identity() -> Identity {
        Identity {
            authid: "joe".into(),
            authrole: "user".into(),
            authextra: None,
        }
    }

    #[test]
    fn test_base_rejects_out_of_order_operations() {
        let session = session();
        let mut base = PendingAuthBase::new(AuthMethod::Ticket, AuthProvider::Static, &session);
        assert!(base.begin_authenticate().unwrap_err().is_hard());
        assert!(base.begin_hello().is_ok());

        base.challenge("realm1", None, JsonMap::new());
        assert_eq!(base.state(), AuthState::ChallengeSent);
        assert!(base.begin_hello().unwrap_err().is_hard());
        assert!(base.begin_authenticate().is_ok());
    }

    #[test]
    fn test_finish_denies_and_forgets_identity() {
        let session = session();
        let mut base = PendingAuthBase::new(AuthMethod::WampCra, AuthProvider::Static, &session);
        base.challenge("realm1", Some(identity()), JsonMap::new());

        let result = base
            .finish("authenticate", Err(AuthenticationError::VerificationFailed))
            .unwrap();
        assert_eq!(result, AuthResult::Deny(Deny::new("authentication failed")));
        assert_eq!(base.state(), AuthState::Denied);
        assert!(base.identity().is_none());
    }

    #[test]
    fn test_finish_after_disconnect_mutates_nothing() {
        let session = session();
        let mut base = PendingAuthBase::new(AuthMethod::WampCra, AuthProvider::Dynamic, &session);
        base.challenge("realm1", Some(identity()), JsonMap::new());
        drop(session);

        let result = base
            .finish(
                "authenticate",
                Err(AuthenticationError::unavailable("late reply")),
            )
            .unwrap();
        assert_eq!(result, AuthResult::Deny(Deny::new("session closed")));
        assert_eq!(base.state(), AuthState::ChallengeSent);
        assert_eq!(base.identity(), Some(&identity()));
    }

    #[test]
    fn test_finish_propagates_protocol_violations() {
        let session = session();
        let mut base = PendingAuthBase::new(AuthMethod::Anonymous, AuthProvider::Static, &session);
        let error = base
            .finish("hello", Err(AuthenticationError::protocol("twice")))
            .unwrap_err();
        assert!(error.is_hard());
        assert_eq!(base.state(), AuthState::New);
    }

    #[test]
    fn test_accept_challenged_uses_recorded_identity() {
        let session = session();
        let mut base = PendingAuthBase::new(AuthMethod::Cryptosign, AuthProvider::Static, &session);
        base.challenge("realm1", Some(identity()), JsonMap::new());
        match base.accept_challenged().unwrap() {
            AuthResult::Accept(accept) => {
                assert_eq!(accept.realm, "realm1");
                assert_eq!(accept.authid, "joe");
                assert_eq!(accept.authmethod, AuthMethod::Cryptosign);
                assert_eq!(accept.authprovider, AuthProvider::Static);
            }
            other => panic!("expected accept, got {other:?}"),
        }
        assert!(base.state().is_terminal());
    }
}

//! Ticket authentication
//!
//! HELLO always gets an empty challenge. The ticket is checked when it
//! arrives in AUTHENTICATE: against configuration, or by forwarding it to the
//! authenticator, which makes the decision itself.

use super::{claimed_authid, AuthEffects, AuthState, CredentialSource, Identity, PendingAuthBase};
use crate::authenticator::request_details;
use crate::config::TicketConfig;
use crate::crypto::constant_time_eq;
use crate::errors::AuthenticationError;
use crate::outcome::{AuthResult, HelloDetails};
use serde_json::Value;
use std::sync::Arc;
use ward_core::{AuthMethod, JsonMap, SessionContext, WardError};

/// Shared-secret ticket handshake
#[derive(Debug)]
pub struct PendingAuthTicket {
    pub(crate) base: PendingAuthBase,
    source: CredentialSource<TicketConfig>,
    hello: HelloDetails,
}

impl PendingAuthTicket {
    /// Create from a ticket method configuration
    pub fn new(
        session: &Arc<SessionContext>,
        config: &serde_json::Value,
        effects: &AuthEffects,
    ) -> Result<Self, WardError> {
        let source = CredentialSource::from_config(AuthMethod::Ticket, config, effects)?;
        Ok(Self {
            base: PendingAuthBase::new(AuthMethod::Ticket, source.provider(), session),
            source,
            hello: HelloDetails::default(),
        })
    }

    /// Current state
    pub fn state(&self) -> AuthState {
        self.base.state()
    }

    /// Ask for the ticket
    pub async fn hello(
        &mut self,
        realm: &str,
        details: &HelloDetails,
    ) -> Result<AuthResult, AuthenticationError> {
        self.base.begin_hello()?;
        self.hello = details.clone();
        Ok(self.base.challenge(realm, None, JsonMap::new()))
    }

    /// Check the ticket the client sent
    pub async fn authenticate(&mut self, ticket: &str) -> Result<AuthResult, AuthenticationError> {
        self.base.begin_authenticate()?;
        let outcome = self.verify(ticket).await;
        self.base.finish("authenticate", outcome)
    }

    async fn verify(&mut self, ticket: &str) -> Result<AuthResult, AuthenticationError> {
        let realm = self.base.realm()?.to_string();
        let claimed = claimed_authid(&self.hello);

        let identity = match &self.source {
            CredentialSource::Static(config) => {
                let authid = claimed.ok_or(AuthenticationError::VerificationFailed)?;
                let principal = config
                    .principals
                    .get(authid)
                    .ok_or(AuthenticationError::VerificationFailed)?;
                if !constant_time_eq(principal.ticket.expose(), ticket.as_bytes()) {
                    return Err(AuthenticationError::VerificationFailed);
                }
                Identity {
                    authid: authid.to_string(),
                    authrole: principal.role.clone(),
                    authextra: principal.extra.clone(),
                }
            }
            CredentialSource::Dynamic(authenticator) => {
                let mut request = {
                    let session = self.base.session()?;
                    request_details(AuthMethod::Ticket, &session, &self.hello)
                };
                request.insert("ticket".into(), Value::from(ticket));

                let response = authenticator
                    .resolve(AuthMethod::Ticket, &realm, claimed, request)
                    .await?;
                self.base.ensure_session()?;

                let authid = response
                    .authid
                    .or_else(|| claimed.map(str::to_string))
                    .ok_or(AuthenticationError::VerificationFailed)?;
                Identity {
                    authid,
                    authrole: response.role,
                    authextra: response.extra,
                }
            }
        };
        Ok(self.base.accept(&realm, identity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::Deny;
    use serde_json::json;
    use ward_core::{PhysicalTimeEffects, RandomEffects};

    struct Fixed;

    #[async_trait::async_trait]
    impl RandomEffects for Fixed {
        async fn random_bytes(&self, len: usize) -> Vec<u8> {
            vec![1; len]
        }
    }

    #[async_trait::async_trait]
    impl PhysicalTimeEffects for Fixed {
        async fn physical_time_ms(&self) -> Result<u64, WardError> {
            Ok(0)
        }
    }

    fn pending() -> (Arc<SessionContext>, PendingAuthTicket) {
        let session = SessionContext::shared(3, JsonMap::new());
        let config = json!({
            "type": "static",
            "principals": {"joe": {"ticket": "secret!!!", "role": "frontend", "extra": {"tier": 1}}}
        });
        let effects = AuthEffects::new(Arc::new(Fixed), Arc::new(Fixed));
        let pending = PendingAuthTicket::new(&session, &config, &effects).unwrap();
        (session, pending)
    }

    #[tokio::test]
    async fn test_hello_sends_empty_challenge() {
        let (_session, mut pending) = pending();
        let result = pending
            .hello("realm1", &HelloDetails::with_authid("joe"))
            .await
            .unwrap();
        match result {
            AuthResult::Challenge(challenge) => {
                assert_eq!(challenge.method, AuthMethod::Ticket);
                assert!(challenge.extra.is_empty());
            }
            other => panic!("expected challenge, got {other:?}"),
        }
        assert_eq!(pending.state(), AuthState::ChallengeSent);
    }

    #[tokio::test]
    async fn test_correct_ticket_is_accepted() {
        let (_session, mut pending) = pending();
        pending
            .hello("realm1", &HelloDetails::with_authid("joe"))
            .await
            .unwrap();
        match pending.authenticate("secret!!!").await.unwrap() {
            AuthResult::Accept(accept) => {
                assert_eq!(accept.authid, "joe");
                assert_eq!(accept.authrole, "frontend");
                assert_eq!(accept.authextra, json!({"tier": 1}).as_object().cloned());
            }
            other => panic!("expected accept, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_wrong_ticket_and_unknown_principal_look_the_same() {
        let (_session, mut wrong) = pending();
        wrong
            .hello("realm1", &HelloDetails::with_authid("joe"))
            .await
            .unwrap();
        let wrong = wrong.authenticate("guess").await.unwrap();

        let (_session, mut unknown) = pending();
        unknown
            .hello("realm1", &HelloDetails::with_authid("mallory"))
            .await
            .unwrap();
        let unknown = unknown.authenticate("secret!!!").await.unwrap();

        assert_eq!(wrong, AuthResult::Deny(Deny::new("authentication failed")));
        assert_eq!(wrong, unknown);
    }

    #[tokio::test]
    async fn test_missing_authid_is_denied() {
        let (_session, mut pending) = pending();
        pending
            .hello("realm1", &HelloDetails::default())
            .await
            .unwrap();
        assert!(pending.authenticate("secret!!!").await.unwrap().is_deny());
        assert_eq!(pending.state(), AuthState::Denied);
    }
}

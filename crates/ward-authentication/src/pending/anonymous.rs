//! Anonymous authentication

use super::{claimed_authid, AuthEffects, CredentialSource, Identity, PendingAuthBase};
use crate::authenticator::request_details;
use crate::config::AnonymousConfig;
use crate::crypto::{generate_serial, SERIAL_ENTROPY_LEN};
use crate::errors::AuthenticationError;
use crate::outcome::{AuthResult, HelloDetails};
use crate::pending::AuthState;
use std::sync::Arc;
use ward_core::{AuthMethod, SessionContext, WardError};

/// Accepts any client, assigning the configured (or authenticator-chosen) role
#[derive(Debug)]
pub struct PendingAuthAnonymous {
    pub(crate) base: PendingAuthBase,
    source: CredentialSource<AnonymousConfig>,
    effects: AuthEffects,
}

impl PendingAuthAnonymous {
    /// Create from an anonymous method configuration
    pub fn new(
        session: &Arc<SessionContext>,
        config: &serde_json::Value,
        effects: &AuthEffects,
    ) -> Result<Self, WardError> {
        let source = CredentialSource::from_config(AuthMethod::Anonymous, config, effects)?;
        Ok(Self {
            base: PendingAuthBase::new(AuthMethod::Anonymous, source.provider(), session),
            source,
            effects: effects.clone(),
        })
    }

    /// Current state
    pub fn state(&self) -> AuthState {
        self.base.state()
    }

    /// Accept or deny straight away
    pub async fn hello(
        &mut self,
        realm: &str,
        details: &HelloDetails,
    ) -> Result<AuthResult, AuthenticationError> {
        self.base.begin_hello()?;
        let outcome = self.resolve(realm, details).await;
        self.base.finish("hello", outcome)
    }

    async fn resolve(
        &mut self,
        realm: &str,
        details: &HelloDetails,
    ) -> Result<AuthResult, AuthenticationError> {
        let identity = match &self.source {
            CredentialSource::Static(config) => {
                let authid = match &config.authid {
                    Some(authid) => authid.clone(),
                    None => self.serial().await,
                };
                Identity {
                    authid,
                    authrole: config.role.clone(),
                    authextra: None,
                }
            }
            CredentialSource::Dynamic(authenticator) => {
                let request = {
                    let session = self.base.session()?;
                    request_details(AuthMethod::Anonymous, &session, details)
                };
                let response = authenticator
                    .resolve(AuthMethod::Anonymous, realm, claimed_authid(details), request)
                    .await?;
                self.base.ensure_session()?;
                let authid = match response.authid {
                    Some(authid) => authid,
                    None => self.serial().await,
                };
                Identity {
                    authid,
                    authrole: response.role,
                    authextra: response.extra,
                }
            }
        };
        Ok(self.base.accept(realm, identity))
    }

    async fn serial(&self) -> String {
        generate_serial(&self.effects.random.random_bytes(SERIAL_ENTROPY_LEN).await)
    }
}

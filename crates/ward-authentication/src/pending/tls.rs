//! TLS client-certificate authentication
//!
//! The transport has already verified the certificate; it reports it as
//! `transport_info.client_cert = {"sha1": "..", "subject": {"cn": ".."}}`.
//! Possession was proven during the TLS handshake, so there is no challenge.
//!
//! A static principal needs a matching certificate. A dynamic authenticator
//! sees the transport info as-is and may admit sessions without one.

use super::{claimed_authid, AuthEffects, AuthState, CredentialSource, Identity, PendingAuthBase};
use crate::authenticator::request_details;
use crate::config::TlsConfig;
use crate::crypto::normalize_fingerprint;
use crate::errors::AuthenticationError;
use crate::outcome::{AuthResult, HelloDetails};
use serde_json::Value;
use std::sync::Arc;
use ward_core::{AuthMethod, SessionContext, WardError};

/// Certificate identity reported by the transport
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ClientCertificate {
    sha1: Option<String>,
    common_name: Option<String>,
}

impl ClientCertificate {
    fn from_session(session: &SessionContext) -> Option<Self> {
        let cert = session.transport_info.get("client_cert")?.as_object()?;
        let sha1 = cert.get("sha1").and_then(Value::as_str).map(str::to_string);
        let common_name = cert
            .get("subject")
            .and_then(|subject| subject.get("cn"))
            .and_then(Value::as_str)
            .map(str::to_string);
        Some(Self { sha1, common_name })
    }
}

/// Certificate handshake
#[derive(Debug)]
pub struct PendingAuthTls {
    pub(crate) base: PendingAuthBase,
    source: CredentialSource<TlsConfig>,
}

impl PendingAuthTls {
    /// Create from a tls method configuration
    pub fn new(
        session: &Arc<SessionContext>,
        config: &serde_json::Value,
        effects: &AuthEffects,
    ) -> Result<Self, WardError> {
        let source = CredentialSource::from_config(AuthMethod::Tls, config, effects)?;
        Ok(Self {
            base: PendingAuthBase::new(AuthMethod::Tls, source.provider(), session),
            source,
        })
    }

    /// Current state
    pub fn state(&self) -> AuthState {
        self.base.state()
    }

    /// Map the certificate to a principal
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
        let claimed = claimed_authid(details);
        let (certificate, request) = {
            let session = self.base.session()?;
            (
                ClientCertificate::from_session(&session),
                request_details(AuthMethod::Tls, &session, details),
            )
        };

        let identity = match &self.source {
            CredentialSource::Static(config) => {
                let fingerprint = certificate
                    .and_then(|cert| cert.sha1)
                    .map(|sha1| normalize_fingerprint(&sha1))
                    .ok_or(AuthenticationError::VerificationFailed)?;
                lookup_static(config, claimed, &fingerprint)?
            }
            CredentialSource::Dynamic(authenticator) => {
                let response = authenticator
                    .resolve(AuthMethod::Tls, realm, claimed, request)
                    .await?;
                self.base.ensure_session()?;

                let authid = response
                    .authid
                    .or_else(|| claimed.map(str::to_string))
                    .or_else(|| certificate.and_then(|cert| cert.common_name))
                    .ok_or_else(|| {
                        AuthenticationError::invalid("no authid for client certificate")
                    })?;
                Identity {
                    authid,
                    authrole: response.role,
                    authextra: response.extra,
                }
            }
        };
        Ok(self.base.accept(realm, identity))
    }
}

fn lookup_static(
    config: &TlsConfig,
    claimed: Option<&str>,
    fingerprint: &str,
) -> Result<Identity, AuthenticationError> {
    let matches = |configured: &str| normalize_fingerprint(configured) == fingerprint;

    let (authid, principal) = match claimed {
        Some(authid) => config
            .principals
            .get_key_value(authid)
            .filter(|(_, principal)| matches(principal.certificate_sha1.as_str())),
        None => config
            .principals
            .iter()
            .find(|(_, principal)| matches(principal.certificate_sha1.as_str())),
    }
    .ok_or(AuthenticationError::VerificationFailed)?;

    Ok(Identity {
        authid: authid.clone(),
        authrole: principal.role.clone(),
        authextra: principal.extra.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use ward_core::{JsonMap, PhysicalTimeEffects, RandomEffects};

    struct Fixed;

    #[async_trait::async_trait]
    impl RandomEffects for Fixed {
        async fn random_bytes(&self, len: usize) -> Vec<u8> {
            vec![0; len]
        }
    }

    #[async_trait::async_trait]
    impl PhysicalTimeEffects for Fixed {
        async fn physical_time_ms(&self) -> Result<u64, WardError> {
            Ok(0)
        }
    }

    fn session_with_cert(sha1: &str) -> Arc<SessionContext> {
        let info = json!({"client_cert": {"sha1": sha1, "subject": {"cn": "device-7"}}});
        SessionContext::shared(5, info.as_object().cloned().unwrap())
    }

    fn config() -> Value {
        json!({
            "type": "static",
            "principals": {
                "device-7": {"certificate_sha1": "AB:CD:EF:01", "role": "device", "extra": {"site": "lab"}}
            }
        })
    }

    fn effects() -> AuthEffects {
        AuthEffects::new(Arc::new(Fixed), Arc::new(Fixed))
    }

    #[tokio::test]
    async fn test_fingerprint_match_ignores_case_and_separators() {
        let session = session_with_cert("abcdef01");
        let mut pending = PendingAuthTls::new(&session, &config(), &effects()).unwrap();
        match pending.hello("realm1", &HelloDetails::default()).await.unwrap() {
            AuthResult::Accept(accept) => {
                assert_eq!(accept.authid, "device-7");
                assert_eq!(accept.authrole, "device");
                assert_eq!(accept.authextra, json!({"site": "lab"}).as_object().cloned());
            }
            other => panic!("expected accept, got {other:?}"),
        }
        assert_eq!(pending.state(), AuthState::Authenticated);
    }

    #[tokio::test]
    async fn test_claimed_authid_must_own_the_certificate() {
        let session = session_with_cert("abcdef01");
        let mut pending = PendingAuthTls::new(&session, &config(), &effects()).unwrap();
        let result = pending
            .hello("realm1", &HelloDetails::with_authid("device-8"))
            .await
            .unwrap();
        assert!(result.is_deny());
    }

    #[tokio::test]
    async fn test_missing_certificate_is_denied() {
        let session = SessionContext::shared(5, JsonMap::new());
        let mut pending = PendingAuthTls::new(&session, &config(), &effects()).unwrap();
        let result = pending.hello("realm1", &HelloDetails::default()).await.unwrap();
        assert!(result.is_deny());
        assert_eq!(pending.state(), AuthState::Denied);
    }
}

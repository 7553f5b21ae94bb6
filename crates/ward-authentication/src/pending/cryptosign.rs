//! Cryptosign (Ed25519) authentication

use super::{claimed_authid, AuthEffects, AuthState, CredentialSource, Identity, PendingAuthBase};
use crate::authenticator::request_details;
use crate::config::CryptosignConfig;
use crate::crypto::{parse_public_key, verify_cryptosign, CHALLENGE_LEN, PUBLIC_KEY_LEN};
use crate::errors::AuthenticationError;
use crate::outcome::{AuthResult, HelloDetails};
use serde_json::Value;
use std::sync::Arc;
use ward_core::{AuthMethod, JsonMap, SessionContext, WardError};

type PublicKey = [u8; PUBLIC_KEY_LEN];

/// Nonce and acceptable keys retained between HELLO and AUTHENTICATE
#[derive(Debug)]
struct Outstanding {
    challenge: [u8; CHALLENGE_LEN],
    keys: Vec<PublicKey>,
}

/// Ed25519 challenge/response handshake
#[derive(Debug)]
pub struct PendingAuthCryptosign {
    pub(crate) base: PendingAuthBase,
    source: CredentialSource<CryptosignConfig>,
    effects: AuthEffects,
    outstanding: Option<Outstanding>,
}

impl PendingAuthCryptosign {
    /// Create from a cryptosign method configuration
    pub fn new(
        session: &Arc<SessionContext>,
        config: &serde_json::Value,
        effects: &AuthEffects,
    ) -> Result<Self, WardError> {
        let source = CredentialSource::from_config(AuthMethod::Cryptosign, config, effects)?;
        Ok(Self {
            base: PendingAuthBase::new(AuthMethod::Cryptosign, source.provider(), session),
            source,
            effects: effects.clone(),
            outstanding: None,
        })
    }

    /// Current state
    pub fn state(&self) -> AuthState {
        self.base.state()
    }

    /// Resolve the principal's keys and send a fresh nonce
    pub async fn hello(
        &mut self,
        realm: &str,
        details: &HelloDetails,
    ) -> Result<AuthResult, AuthenticationError> {
        self.base.begin_hello()?;
        let outcome = self.challenge(realm, details).await;
        self.base.finish("hello", outcome)
    }

    /// Verify the signature over the nonce
    pub async fn authenticate(&mut self, signature: &str) -> Result<AuthResult, AuthenticationError> {
        self.base.begin_authenticate()?;
        let outcome = self.verify(signature);
        self.base.finish("authenticate", outcome)
    }

    async fn challenge(
        &mut self,
        realm: &str,
        details: &HelloDetails,
    ) -> Result<AuthResult, AuthenticationError> {
        let claimed = claimed_authid(details);
        let advertised = details.authextra_str("pubkey")?;

        let (identity, keys) = match &self.source {
            CredentialSource::Static(config) => lookup_static(config, claimed, advertised)?,
            CredentialSource::Dynamic(authenticator) => {
                let request = {
                    let session = self.base.session()?;
                    request_details(AuthMethod::Cryptosign, &session, details)
                };
                let response = authenticator
                    .resolve(AuthMethod::Cryptosign, realm, claimed, request)
                    .await?;
                self.base.ensure_session()?;

                let pubkey = response.credential.ok_or_else(|| {
                    AuthenticationError::invalid("authenticator returned no pubkey")
                })?;
                let key = parse_public_key(pubkey.expose_str())?;
                let authid = response
                    .authid
                    .or_else(|| claimed.map(str::to_string))
                    .unwrap_or_else(|| hex::encode(key));
                let identity = Identity {
                    authid,
                    authrole: response.role,
                    authextra: response.extra,
                };
                (identity, vec![key])
            }
        };

        let challenge = self.effects.random.random_bytes_32().await;
        let mut extra = JsonMap::new();
        extra.insert("challenge".into(), Value::from(hex::encode(challenge)));
        extra.insert("channel_binding".into(), Value::Null);

        self.outstanding = Some(Outstanding { challenge, keys });
        Ok(self.base.challenge(realm, Some(identity), extra))
    }

    fn verify(&mut self, signature: &str) -> Result<AuthResult, AuthenticationError> {
        let outstanding = self
            .outstanding
            .take()
            .ok_or_else(|| AuthenticationError::protocol("no challenge outstanding"))?;
        verify_cryptosign(signature, &outstanding.challenge, &outstanding.keys)?;
        self.base.accept_challenged()
    }
}

/// Find the principal by authid, or by advertised key when no authid was given
fn lookup_static(
    config: &CryptosignConfig,
    claimed: Option<&str>,
    advertised: Option<&str>,
) -> Result<(Identity, Vec<PublicKey>), AuthenticationError> {
    let same_key = |configured: &String, advertised: &str| configured.eq_ignore_ascii_case(advertised);

    let (authid, principal) = match (claimed, advertised) {
        (Some(authid), _) => {
            let principal = config
                .principals
                .get(authid)
                .ok_or(AuthenticationError::VerificationFailed)?;
            (authid.to_string(), principal)
        }
        (None, Some(pubkey)) => config
            .principals
            .iter()
            .find(|(_, principal)| {
                principal
                    .authorized_keys
                    .iter()
                    .any(|configured| same_key(configured, pubkey))
            })
            .map(|(authid, principal)| (authid.clone(), principal))
            .ok_or(AuthenticationError::VerificationFailed)?,
        (None, None) => {
            return Err(AuthenticationError::invalid(
                "cryptosign needs an authid or authextra.pubkey",
            ))
        }
    };

    let candidates: Vec<&String> = match advertised {
        Some(pubkey) => {
            let matching: Vec<&String> = principal
                .authorized_keys
                .iter()
                .filter(|configured| same_key(*configured, pubkey))
                .collect();
            if matching.is_empty() {
                return Err(AuthenticationError::VerificationFailed);
            }
            matching
        }
        None => principal.authorized_keys.iter().collect(),
    };
    let keys: Vec<_> = candidates
        .into_iter()
        .filter_map(|key| match parse_public_key(key) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!(authid = %authid, error = %e, "skipping unusable authorized key");
                None
            }
        })
        .collect();
    if keys.is_empty() {
        return Err(AuthenticationError::invalid(
            "principal has no usable authorized key",
        ));
    }

    Ok((
        Identity {
            authid,
            authrole: principal.role.clone(),
            authextra: principal.extra.clone(),
        },
        keys,
    ))
}

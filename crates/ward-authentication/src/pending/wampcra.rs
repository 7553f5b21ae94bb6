//! WAMP-CRA authentication
//!
//! HELLO resolves the user's secret and answers with a challenge string; the
//! client proves it knows the secret by returning
//! `base64(HMAC-SHA256(key, challenge))`.

use super::{claimed_authid, AuthEffects, AuthState, CredentialSource, Identity, PendingAuthBase};
use crate::authenticator::request_details;
use crate::config::{SecretString, WampCraConfig};
use crate::crypto::{compute_wcs, constant_time_eq, derive_key, DEFAULT_ITERATIONS, DEFAULT_KEYLEN};
use crate::errors::AuthenticationError;
use crate::outcome::{AuthProvider, AuthResult, HelloDetails};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use ward_core::{AuthMethod, JsonMap, SessionContext, SessionId, WardError};

const NONCE_LEN: usize = 16;

/// Secret plus optional salting, however it was obtained
struct ResolvedUser {
    identity: Identity,
    secret: SecretString,
    salt: Option<String>,
    iterations: Option<u32>,
    keylen: Option<u32>,
}

/// Challenge and key retained between HELLO and AUTHENTICATE
#[derive(Debug)]
struct Outstanding {
    challenge: String,
    key: SecretString,
}

/// HMAC challenge/response handshake
#[derive(Debug)]
pub struct PendingAuthWampCra {
    pub(crate) base: PendingAuthBase,
    source: CredentialSource<WampCraConfig>,
    effects: AuthEffects,
    outstanding: Option<Outstanding>,
}

impl PendingAuthWampCra {
    /// Create from a wampcra method configuration
    pub fn new(
        session: &Arc<SessionContext>,
        config: &serde_json::Value,
        effects: &AuthEffects,
    ) -> Result<Self, WardError> {
        let source = CredentialSource::from_config(AuthMethod::WampCra, config, effects)?;
        Ok(Self {
            base: PendingAuthBase::new(AuthMethod::WampCra, source.provider(), session),
            source,
            effects: effects.clone(),
            outstanding: None,
        })
    }

    /// Current state
    pub fn state(&self) -> AuthState {
        self.base.state()
    }

    /// Resolve the user and issue a challenge
    pub async fn hello(
        &mut self,
        realm: &str,
        details: &HelloDetails,
    ) -> Result<AuthResult, AuthenticationError> {
        self.base.begin_hello()?;
        let outcome = self.challenge(realm, details).await;
        self.base.finish("hello", outcome)
    }

    /// Check the client's HMAC of the challenge
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
        let claimed = claimed_authid(details).ok_or(AuthenticationError::VerificationFailed)?;

        let user = match &self.source {
            CredentialSource::Static(config) => {
                let user = config
                    .users
                    .get(claimed)
                    .ok_or(AuthenticationError::VerificationFailed)?;
                ResolvedUser {
                    identity: Identity {
                        authid: claimed.to_string(),
                        authrole: user.role.clone(),
                        authextra: user.extra.clone(),
                    },
                    secret: user.secret.clone(),
                    salt: user.salt.clone(),
                    iterations: user.iterations,
                    keylen: user.keylen,
                }
            }
            CredentialSource::Dynamic(authenticator) => {
                let request = {
                    let session = self.base.session()?;
                    request_details(AuthMethod::WampCra, &session, details)
                };
                let response = authenticator
                    .resolve(AuthMethod::WampCra, realm, Some(claimed), request)
                    .await?;
                self.base.ensure_session()?;

                let secret = response.credential.ok_or_else(|| {
                    AuthenticationError::invalid("authenticator returned no secret")
                })?;
                let derivation = response.key_derivation;
                ResolvedUser {
                    identity: Identity {
                        authid: response.authid.unwrap_or_else(|| claimed.to_string()),
                        authrole: response.role,
                        authextra: response.extra,
                    },
                    secret,
                    salt: derivation.as_ref().map(|d| d.salt.clone()),
                    iterations: derivation.as_ref().and_then(|d| d.iterations),
                    keylen: derivation.as_ref().and_then(|d| d.keylen),
                }
            }
        };

        let nonce = hex::encode(self.effects.random.random_bytes(NONCE_LEN).await);
        let now_ms = self.effects.time.physical_time_ms().await.map_err(|e| {
            AuthenticationError::unavailable(format!("clock unavailable: {e}"))
        })?;
        let challenge = challenge_string(
            &user.identity,
            self.base.provider,
            &nonce,
            now_ms,
            self.base.session_id,
        )?;

        let mut extra = JsonMap::new();
        extra.insert("challenge".into(), Value::from(challenge.as_str()));
        let key = match &user.salt {
            Some(salt) => {
                let iterations = user.iterations.unwrap_or(DEFAULT_ITERATIONS);
                let keylen = user.keylen.unwrap_or(DEFAULT_KEYLEN);
                extra.insert("salt".into(), Value::from(salt.as_str()));
                extra.insert("iterations".into(), Value::from(iterations));
                extra.insert("keylen".into(), Value::from(keylen));
                derive_key(user.secret.expose(), salt.as_bytes(), iterations, keylen)?
            }
            None => user.secret.clone(),
        };

        self.outstanding = Some(Outstanding { challenge, key });
        Ok(self.base.challenge(realm, Some(user.identity), extra))
    }

    fn verify(&mut self, signature: &str) -> Result<AuthResult, AuthenticationError> {
        let outstanding = self
            .outstanding
            .take()
            .ok_or_else(|| AuthenticationError::protocol("no challenge outstanding"))?;
        let expected = compute_wcs(outstanding.key.expose(), &outstanding.challenge)?;
        if !constant_time_eq(expected.as_bytes(), signature.as_bytes()) {
            return Err(AuthenticationError::VerificationFailed);
        }
        self.base.accept_challenged()
    }
}

/// Compact JSON challenge the client signs
fn challenge_string(
    identity: &Identity,
    provider: AuthProvider,
    nonce: &str,
    now_ms: u64,
    session_id: SessionId,
) -> Result<String, AuthenticationError> {
    let timestamp = i64::try_from(now_ms)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .ok_or_else(|| AuthenticationError::unavailable("clock out of range"))?
        .to_rfc3339_opts(SecondsFormat::Millis, true);

    let challenge = json!({
        "authid": identity.authid,
        "authrole": identity.authrole,
        "authmethod": AuthMethod::WampCra.as_str(),
        "authprovider": provider.as_str(),
        "nonce": nonce,
        "timestamp": timestamp,
        "session": session_id.value(),
    });
    Ok(challenge.to_string())
}

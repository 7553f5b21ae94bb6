//! Sessions and credentials for tests

use ed25519_dalek::{Signer, SigningKey};
use serde_json::json;
use std::sync::Arc;
use ward_core::{JsonMap, SessionContext};

/// Session with a plain transport description
pub fn session(id: u64) -> Arc<SessionContext> {
    let mut transport_info = JsonMap::new();
    transport_info.insert("type".into(), json!("websocket"));
    transport_info.insert("peer".into(), json!("tcp4:127.0.0.1:48210"));
    SessionContext::shared(id, transport_info)
}

/// Session whose transport verified a client certificate
pub fn session_with_certificate(id: u64, sha1: &str, common_name: &str) -> Arc<SessionContext> {
    let mut transport_info = JsonMap::new();
    transport_info.insert("type".into(), json!("rawsocket"));
    transport_info.insert("peer".into(), json!("tcp4:127.0.0.1:48211"));
    transport_info.insert(
        "client_cert".into(),
        json!({"sha1": sha1, "subject": {"cn": common_name}}),
    );
    SessionContext::shared(id, transport_info)
}

/// Deterministic Ed25519 key for cryptosign tests
#[derive(Debug, Clone)]
pub struct TestKey {
    signing_key: SigningKey,
}

impl TestKey {
    /// Key derived from a one-byte seed
    pub fn from_seed(seed: u8) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&[seed; 32]),
        }
    }

    /// Hex-encoded public key, as configured in `authorized_keys`
    pub fn public_hex(&self) -> String {
        hex::encode(self.signing_key.verifying_key().to_bytes())
    }

    /// Hex signature over a hex-encoded challenge
    pub fn sign_challenge(&self, challenge_hex: &str) -> String {
        let challenge = hex::decode(challenge_hex).expect("challenge is not hex");
        hex::encode(self.signing_key.sign(&challenge).to_bytes())
    }

    /// Hex of signature followed by the challenge it covers
    pub fn sign_challenge_with_message(&self, challenge_hex: &str) -> String {
        let challenge = hex::decode(challenge_hex).expect("challenge is not hex");
        let mut signed = self.signing_key.sign(&challenge).to_bytes().to_vec();
        signed.extend_from_slice(&challenge);
        hex::encode(signed)
    }
}

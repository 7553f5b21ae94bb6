//! Credential primitives used by the handshakes
//!
//! WAMP-CRA key derivation: when a salt is configured, the HMAC key is the
//! base64 encoding of `PBKDF2-HMAC-SHA256(secret, salt, iterations, keylen)`;
//! without a salt the secret is used as-is. The client-facing signature is
//! `base64(HMAC-SHA256(key, challenge))`.

use crate::config::SecretString;
use crate::errors::AuthenticationError;
use base64::Engine;
use ed25519_dalek::{Signature, VerifyingKey};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

type HmacSha256 = Hmac<Sha256>;

/// Default PBKDF2 iteration count for salted WAMP-CRA secrets
pub const DEFAULT_ITERATIONS: u32 = 1000;

/// Default derived key length in bytes for salted WAMP-CRA secrets
pub const DEFAULT_KEYLEN: u32 = 32;

/// Largest PBKDF2 iteration count accepted for a salted secret
///
/// Derivation runs on the handshake task, so this bounds how long one HELLO
/// can occupy it.
pub const MAX_ITERATIONS: u32 = 100_000;

/// Largest derived key length in bytes (two SHA-256 blocks)
pub const MAX_KEYLEN: u32 = 64;

/// Length of an Ed25519 public key in bytes
pub const PUBLIC_KEY_LEN: usize = 32;

/// Length of a cryptosign challenge in bytes
pub const CHALLENGE_LEN: usize = 32;

const SIGNATURE_LEN: usize = 64;

/// Unambiguous alphabet for generated authids (no 0/O, 1/I)
const SERIAL_ALPHABET: &[u8; 32] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZ";
const SERIAL_GROUPS: usize = 6;
const SERIAL_GROUP_LEN: usize = 4;

/// Number of random bytes `generate_serial` consumes
pub const SERIAL_ENTROPY_LEN: usize = SERIAL_GROUPS * SERIAL_GROUP_LEN;

/// Compare two byte strings without leaking where they differ
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Derive the WAMP-CRA HMAC key from a salted secret
///
/// `iterations` must be in `1..=MAX_ITERATIONS` and `keylen` in `1..=MAX_KEYLEN`.
pub fn derive_key(
    secret: &[u8],
    salt: &[u8],
    iterations: u32,
    keylen: u32,
) -> Result<SecretString, AuthenticationError> {
    if !(1..=MAX_ITERATIONS).contains(&iterations) {
        return Err(AuthenticationError::invalid(format!(
            "iterations must be between 1 and {MAX_ITERATIONS}"
        )));
    }
    if !(1..=MAX_KEYLEN).contains(&keylen) {
        return Err(AuthenticationError::invalid(format!(
            "keylen must be between 1 and {MAX_KEYLEN}"
        )));
    }
    let mut derived = Zeroizing::new(vec![0u8; keylen as usize]);
    pbkdf2::pbkdf2_hmac::<Sha256>(secret, salt, iterations, &mut derived);
    Ok(SecretString::new(
        base64::engine::general_purpose::STANDARD.encode(derived.as_slice()),
    ))
}

/// Base64 HMAC-SHA256 of `challenge` under `key`
pub fn compute_wcs(key: &[u8], challenge: &str) -> Result<String, AuthenticationError> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|_| AuthenticationError::invalid("HMAC key rejected"))?;
    mac.update(challenge.as_bytes());
    Ok(base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
}

/// Parse a hex-encoded Ed25519 public key
///
/// Only the encoding is checked here; whether the bytes are a valid curve
/// point is left to verification.
pub fn parse_public_key(hex_key: &str) -> Result<[u8; PUBLIC_KEY_LEN], AuthenticationError> {
    let mut key = [0u8; PUBLIC_KEY_LEN];
    hex::decode_to_slice(hex_key, &mut key).map_err(|_| {
        AuthenticationError::invalid(format!(
            "public key must be {} hex characters",
            PUBLIC_KEY_LEN * 2
        ))
    })?;
    Ok(key)
}

/// Verify a cryptosign response against `challenge`
///
/// `response` is hex of either the bare 64-byte signature or the 96-byte
/// signed message (signature followed by the challenge it covers).
pub fn verify_cryptosign(
    response: &str,
    challenge: &[u8; CHALLENGE_LEN],
    keys: &[[u8; PUBLIC_KEY_LEN]],
) -> Result<(), AuthenticationError> {
    let raw = hex::decode(response)
        .map_err(|_| AuthenticationError::invalid("signature must be hex encoded"))?;

    let signature_bytes = match raw.len() {
        SIGNATURE_LEN => &raw[..],
        len if len == SIGNATURE_LEN + CHALLENGE_LEN => {
            let (signature, signed) = raw.split_at(SIGNATURE_LEN);
            if !constant_time_eq(signed, challenge) {
                return Err(AuthenticationError::VerificationFailed);
            }
            signature
        }
        _ => {
            return Err(AuthenticationError::invalid(format!(
                "signature must be {} or {} bytes",
                SIGNATURE_LEN,
                SIGNATURE_LEN + CHALLENGE_LEN
            )))
        }
    };
    let signature = Signature::from_slice(signature_bytes)
        .map_err(|_| AuthenticationError::invalid("malformed signature"))?;

    let verified = keys.iter().any(|key| {
        VerifyingKey::from_bytes(key)
            .map(|verifying_key| verifying_key.verify_strict(challenge, &signature).is_ok())
            .unwrap_or(false)
    });
    if verified {
        Ok(())
    } else {
        Err(AuthenticationError::VerificationFailed)
    }
}

/// Normalize a certificate fingerprint: lowercase hex without separators
pub fn normalize_fingerprint(fingerprint: &str) -> String {
    fingerprint
        .chars()
        .filter(|c| *c != ':')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Format random bytes as `XXXX-XXXX-XXXX-XXXX-XXXX-XXXX`
pub fn generate_serial(entropy: &[u8]) -> String {
    let chars: Vec<char> = entropy
        .iter()
        .take(SERIAL_ENTROPY_LEN)
        .map(|byte| SERIAL_ALPHABET[(byte & 0x1f) as usize] as char)
        .collect();
    chars
        .chunks(SERIAL_GROUP_LEN)
        .map(|group| group.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"secret", b"secret"));
        assert!(!constant_time_eq(b"secret", b"secreT"));
        assert!(!constant_time_eq(b"secret", b"secrets"));
    }

    #[test]
    fn test_derive_key_is_deterministic_and_salt_sensitive() {
        let a = derive_key(b"secret", b"salt", 100, 32).unwrap();
        let b = derive_key(b"secret", b"salt", 100, 32).unwrap();
        let c = derive_key(b"secret", b"pepper", 100, 32).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        // base64 of 32 bytes
        assert_eq!(a.expose().len(), 44);
    }

    #[test]
    fn test_derive_key_rejects_unbounded_parameters() {
        for (iterations, keylen) in [
            (0, 32),
            (MAX_ITERATIONS + 1, 32),
            (4_000_000_000, 32),
            (100, 0),
            (100, MAX_KEYLEN + 1),
            (100, 4_000_000_000),
        ] {
            assert!(matches!(
                derive_key(b"secret", b"salt", iterations, keylen),
                Err(AuthenticationError::InvalidCredentialFormat(_))
            ));
        }
        assert!(derive_key(b"secret", b"salt", 1, MAX_KEYLEN).is_ok());
    }

    #[test]
    fn test_compute_wcs_matches_hmac() {
        let sig = compute_wcs(b"key", "The quick brown fox jumps over the lazy dog").unwrap();
        // RFC-style HMAC-SHA256 test vector, base64 encoded
        assert_eq!(sig, "97yD9DBThCSxMpjmqm+xQ+9NWaFJRhdZl0edvC0aPNg=");
    }

    #[test]
    fn test_parse_public_key() {
        assert!(parse_public_key(&"ab".repeat(32)).is_ok());
        assert!(parse_public_key(&"ab".repeat(31)).is_err());
        assert!(parse_public_key(&"zz".repeat(32)).is_err());
    }

    #[test]
    fn test_verify_cryptosign_accepts_both_encodings() {
        let signing_key = SigningKey::from_bytes(&[7u8; 32]);
        let public = signing_key.verifying_key().to_bytes();
        let challenge = [9u8; CHALLENGE_LEN];
        let signature = signing_key.sign(&challenge).to_bytes();

        let bare = hex::encode(signature);
        assert!(verify_cryptosign(&bare, &challenge, &[public]).is_ok());

        let mut signed = signature.to_vec();
        signed.extend_from_slice(&challenge);
        assert!(verify_cryptosign(&hex::encode(signed), &challenge, &[public]).is_ok());
    }

    #[test]
    fn test_verify_cryptosign_rejects_other_challenge() {
        let signing_key = SigningKey::from_bytes(&[7u8; 32]);
        let public = signing_key.verifying_key().to_bytes();
        let signature = signing_key.sign(&[1u8; CHALLENGE_LEN]).to_bytes();

        let result = verify_cryptosign(&hex::encode(signature), &[2u8; CHALLENGE_LEN], &[public]);
        assert_eq!(result, Err(AuthenticationError::VerificationFailed));
    }

    #[test]
    fn test_verify_cryptosign_rejects_bad_length() {
        let result = verify_cryptosign("abcd", &[0u8; CHALLENGE_LEN], &[[0u8; 32]]);
        assert!(matches!(
            result,
            Err(AuthenticationError::InvalidCredentialFormat(_))
        ));
    }

    #[test]
    fn test_normalize_fingerprint() {
        assert_eq!(normalize_fingerprint("AB:cd:01"), "abcd01");
    }

    #[test]
    fn test_generate_serial_format() {
        let serial = generate_serial(&[0u8; SERIAL_ENTROPY_LEN]);
        assert_eq!(serial, "2222-2222-2222-2222-2222-2222");
        let serial = generate_serial(&(0u8..24).collect::<Vec<_>>());
        assert_eq!(serial.len(), 29);
        assert!(serial.chars().all(|c| c == '-' || SERIAL_ALPHABET.contains(&(c as u8))));
    }
}

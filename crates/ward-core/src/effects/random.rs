//! Randomness effect trait
//!
//! # Effect Classification
//!
//! - **Category**: Infrastructure Effect
//! - **Implementation**: `ward-effects` (OS randomness), `ward-testkit` (seeded)
//! - **Usage**: challenge nonces, WAMP-CRA nonces, generated anonymous authids

use async_trait::async_trait;

/// Source of cryptographically secure random bytes
#[async_trait]
pub trait RandomEffects: Send + Sync {
    /// Fill and return `len` random bytes
    async fn random_bytes(&self, len: usize) -> Vec<u8>;

    /// Return 32 random bytes
    async fn random_bytes_32(&self) -> [u8; 32] {
        let bytes = self.random_bytes(32).await;
        let mut out = [0u8; 32];
        for (slot, byte) in out.iter_mut().zip(bytes) {
            *slot = byte;
        }
        out
    }
}

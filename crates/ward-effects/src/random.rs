//! Random effect handler
//!
//! Note: This module legitimately uses `rand::thread_rng()` as it implements the
//! `RandomEffects` trait - this is the effect handler layer where actual system
//! randomness is provided.

#![allow(clippy::disallowed_methods)]

use async_trait::async_trait;
use rand::RngCore;
use ward_core::RandomEffects;

/// Real random handler using actual cryptographically secure randomness
#[derive(Debug, Clone, Default)]
pub struct RealRandomHandler;

impl RealRandomHandler {
    /// Create a new real random handler
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RandomEffects for RealRandomHandler {
    async fn random_bytes(&self, len: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; len];
        rand::thread_rng().fill_bytes(&mut bytes);
        bytes
    }

    async fn random_bytes_32(&self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_random_bytes_length_and_freshness() {
        let handler = RealRandomHandler::new();
        let a = handler.random_bytes(32).await;
        let b = handler.random_bytes(32).await;
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
        assert_ne!(handler.random_bytes_32().await, handler.random_bytes_32().await);
    }
}

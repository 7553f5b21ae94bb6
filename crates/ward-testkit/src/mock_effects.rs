//! Mock effects for deterministic testing
//!
//! - Randomness from a seeded ChaCha20 RNG, so nonces and generated authids
//!   repeat across runs
//! - A physical clock that only moves when a test advances it
//!
//! # Blocking Lock Usage
//!
//! Uses `std::sync::Mutex`: test infrastructure, no lock is held across an
//! await, and a synchronous API keeps the tests simple.

#![allow(clippy::disallowed_types)]

use async_trait::async_trait;
use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::sync::{Arc, Mutex};
use ward_core::{PhysicalTimeEffects, RandomEffects, WardError};

/// 2022-01-01 00:00:00 UTC
pub const DEFAULT_TIME_MS: u64 = 1_640_995_200_000;

/// Deterministic random and time handlers
#[derive(Debug, Clone)]
pub struct MockEffects {
    state: Arc<Mutex<MockState>>,
}

#[derive(Debug)]
struct MockState {
    rng: ChaCha20Rng,
    physical_time_ms: u64,
}

impl MockEffects {
    /// Mock effects with a fixed seed
    pub fn deterministic() -> Self {
        Self::with_seed([42; 32])
    }

    /// Mock effects with a specific seed
    pub fn with_seed(seed: [u8; 32]) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                rng: ChaCha20Rng::from_seed(seed),
                physical_time_ms: DEFAULT_TIME_MS,
            })),
        }
    }

    /// Move the clock forward
    pub fn advance_time(&self, ms: u64) {
        let mut state = self.state.lock().unwrap();
        state.physical_time_ms += ms;
    }

    /// Set the clock
    pub fn set_time(&self, ms: u64) {
        self.state.lock().unwrap().physical_time_ms = ms;
    }
}

impl Default for MockEffects {
    fn default() -> Self {
        Self::deterministic()
    }
}

#[async_trait]
impl RandomEffects for MockEffects {
    async fn random_bytes(&self, len: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; len];
        self.state.lock().unwrap().rng.fill_bytes(&mut bytes);
        bytes
    }
}

#[async_trait]
impl PhysicalTimeEffects for MockEffects {
    async fn physical_time_ms(&self) -> Result<u64, WardError> {
        Ok(self.state.lock().unwrap().physical_time_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_same_seed_same_bytes() {
        let a = MockEffects::with_seed([7; 32]);
        let b = MockEffects::with_seed([7; 32]);
        assert_eq!(a.random_bytes(16).await, b.random_bytes(16).await);
        assert_ne!(a.random_bytes(16).await, MockEffects::deterministic().random_bytes(16).await);
    }

    #[tokio::test]
    async fn test_clock_only_moves_when_advanced() {
        let effects = MockEffects::deterministic();
        assert_eq!(effects.physical_time_ms().await.unwrap(), DEFAULT_TIME_MS);
        effects.advance_time(250);
        assert_eq!(effects.physical_time_ms().await.unwrap(), DEFAULT_TIME_MS + 250);
    }
}

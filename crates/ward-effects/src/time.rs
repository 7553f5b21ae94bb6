//! Wall-clock handler

#![allow(clippy::disallowed_methods)]

use async_trait::async_trait;
use ward_core::{PhysicalTimeEffects, WardError};

/// System clock
#[derive(Debug, Clone, Default)]
pub struct RealTimeHandler;

impl RealTimeHandler {
    /// Create a new real time handler
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PhysicalTimeEffects for RealTimeHandler {
    async fn physical_time_ms(&self) -> Result<u64, WardError> {
        let millis = chrono::Utc::now().timestamp_millis();
        u64::try_from(millis)
            .map_err(|_| WardError::internal(format!("system clock before epoch: {millis}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_clock_is_after_2020() {
        let now = RealTimeHandler::new().physical_time_ms().await.unwrap();
        assert!(now > 1_577_836_800_000);
    }
}

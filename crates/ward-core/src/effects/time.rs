//! Wall-clock effect trait
//!
//! Only WAMP-CRA needs the clock: the challenge embeds an issue timestamp.

use crate::WardError;
use async_trait::async_trait;

/// Physical (wall-clock) time
#[async_trait]
pub trait PhysicalTimeEffects: Send + Sync {
    /// Milliseconds since the Unix epoch
    async fn physical_time_ms(&self) -> Result<u64, WardError>;
}

//! Ward Effects - production handlers
//!
//! Stateless implementations of the effect traits declared in `ward-core`.
//! This is the only layer that touches OS randomness and the system clock;
//! the remote call capability is supplied by the router's session layer.

pub mod random;
pub mod time;

pub use random::RealRandomHandler;
pub use time::RealTimeHandler;

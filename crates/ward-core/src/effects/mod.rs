//! Effect interfaces for the auth core
//!
//! Every source of nondeterminism or I/O the handshakes touch is reached
//! through one of these traits, so tests can substitute deterministic handlers:
//!
//! - `RandomEffects`: nonces, challenges, generated authids
//! - `PhysicalTimeEffects`: challenge timestamps
//! - `RemoteCallEffects`: the single outbound call to a dynamic authenticator

pub mod random;
pub mod remote;
pub mod time;

pub use random::RandomEffects;
pub use remote::RemoteCallEffects;
pub use time::PhysicalTimeEffects;

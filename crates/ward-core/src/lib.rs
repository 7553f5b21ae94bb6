//! Ward Core - shared foundation for the router auth core
//!
//! This crate holds the pieces that both halves of the auth core agree on:
//!
//! - Identifiers: `SessionId`, `AuthMethod`, `Action`
//! - The session handle (`SessionContext`) that pending handshakes reference weakly
//! - A single unified error type (`WardError`)
//! - Configuration validation helpers
//! - Effect interfaces (`RandomEffects`, `PhysicalTimeEffects`, `RemoteCallEffects`)
//!
//! Nothing in here performs I/O. Handlers for the effect traits live in
//! `ward-effects` (production) and `ward-testkit` (deterministic).

#![forbid(unsafe_code)]

/// Configuration traits and validation
pub mod config;

/// Pure effect interfaces (no implementations)
pub mod effects;

/// Unified error handling
pub mod errors;

/// Session handle shared with the session layer
pub mod session;

/// Identifiers and small value types
pub mod types;

pub use config::{ConfigValidation, ConfigValidator, ValidationError};
pub use effects::{PhysicalTimeEffects, RandomEffects, RemoteCallEffects};
pub use errors::{Result, WardError};
pub use session::SessionContext;
pub use types::{Action, AuthMethod, JsonMap, SessionId};

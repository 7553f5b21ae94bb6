//! Ward Testing Infrastructure
//!
//! Deterministic handlers for the `ward-core` effect traits plus fixtures
//! shared by the handshake and authorization test suites.
//!
//! ```toml
//! [dev-dependencies]
//! ward-testkit = { path = "../ward-testkit" }
//! ```
//!
//! ```rust,no_run
//! use serde_json::json;
//! use ward_testkit::{MockAuthenticator, MockEffects};
//!
//! let effects = MockEffects::deterministic();
//! let authenticator = MockAuthenticator::returning(json!({"role": "user"}));
//! ```

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

pub mod authenticator;
pub mod fixtures;
pub mod mock_effects;

pub use authenticator::{MockAuthenticator, MockReply, RecordedCall};
pub use fixtures::{session, session_with_certificate, TestKey};
pub use mock_effects::MockEffects;

/// Install a test log subscriber once; later calls are no-ops
///
/// Honors `RUST_LOG`, defaulting to `warn`.
pub fn init_test_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
    tracing::trace!("test tracing initialized");
}

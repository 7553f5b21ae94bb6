//! Remote procedure call capability
//!
//! This is the narrow "resolver" a pending handshake is handed when its method
//! is configured as `dynamic`: given a procedure name and positional
//! arguments, perform exactly one remote call and return its result. How the
//! call is routed (through the realm's internal session, over a router link,
//! ...) is the session layer's business.
//!
//! # Effect Classification
//!
//! - **Category**: Infrastructure Effect
//! - **Implementation**: provided by the router's session layer
//! - **Usage**: `ward-authentication`'s dynamic authenticator client

use crate::WardError;
use async_trait::async_trait;
use serde_json::Value;

/// Perform one outbound remote procedure call
#[async_trait]
pub trait RemoteCallEffects: Send + Sync {
    /// Call `procedure` with positional `args`
    ///
    /// Implementations must not retry; an error is reported as-is.
    async fn call(&self, procedure: &str, args: Vec<Value>) -> Result<Value, WardError>;
}

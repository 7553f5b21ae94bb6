//! Session handle shared between the session layer and pending handshakes
//!
//! The session layer owns the `Arc<SessionContext>` for as long as the
//! connection lives. Pending handshakes keep only a `Weak` reference so a
//! disconnect is observable after any suspended remote call returns.

use crate::types::{JsonMap, SessionId};
use std::sync::Arc;

/// What the auth core may know about the session it is authenticating
#[derive(Debug, Clone, PartialEq)]
pub struct SessionContext {
    /// Router-assigned session id
    pub session_id: SessionId,

    /// Transport metadata (peer address, verified client certificate, ...)
    ///
    /// Opaque to the engine except for `client_cert`, which the TLS method reads.
    pub transport_info: JsonMap,
}

impl SessionContext {
    /// Create a session handle with the given transport metadata
    pub fn new(session_id: impl Into<SessionId>, transport_info: JsonMap) -> Self {
        Self {
            session_id: session_id.into(),
            transport_info,
        }
    }

    /// Convenience for the session layer: wrap in the `Arc` it will own
    pub fn shared(session_id: impl Into<SessionId>, transport_info: JsonMap) -> Arc<Self> {
        Arc::new(Self::new(session_id, transport_info))
    }
}

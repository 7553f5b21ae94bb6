//! Authorization decisions

use serde::{Deserialize, Serialize};

/// Outcome of evaluating one action on one URI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorization {
    /// Whether the action is permitted
    pub allow: bool,

    /// Whether the acting session's identity is disclosed to the other side
    /// (callee for `call`, subscribers for `publish`)
    pub disclose: bool,

    /// Whether the router may cache this decision for the session
    pub cache: bool,
}

impl Authorization {
    /// The default-deny decision
    pub fn deny() -> Self {
        Self::default()
    }
}

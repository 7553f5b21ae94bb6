//! Identifiers and small value types shared across the auth core

pub mod identifiers;

pub use identifiers::{Action, AuthMethod, SessionId};

/// Open JSON mapping used for `authextra`, transport metadata and remote call details
pub type JsonMap = serde_json::Map<String, serde_json::Value>;

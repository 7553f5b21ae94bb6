//! Unified error system for Ward core
//!
//! A single error type shared by every crate in the workspace. Handshake
//! outcomes are not errors; see `ward-authentication` for how failures are
//! folded into denials.

use serde::{Deserialize, Serialize};

/// Unified error type for all Ward operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum WardError {
    /// Invalid input or configuration
    #[error("Invalid: {message}")]
    Invalid {
        /// Error message describing the invalid input
        message: String,
    },

    /// Remote call or transport error
    #[error("Network error: {message}")]
    Network {
        /// Error message describing the network issue
        message: String,
    },

    /// Internal system error
    #[error("Internal error: {message}")]
    Internal {
        /// Error message describing the internal error
        message: String,
    },
}

impl WardError {
    /// Create an invalid input error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Standard Result type for Ward operations
pub type Result<T> = std::result::Result<T, WardError>;

impl From<serde_json::Error> for WardError {
    fn from(err: serde_json::Error) -> Self {
        Self::invalid(err.to_string())
    }
}

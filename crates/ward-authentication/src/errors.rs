//! Authentication errors
//!
//! Only `ProtocolViolation` is allowed to reach the session layer as an error.
//! Every other variant is folded into a `Deny` whose reason is one of a few
//! fixed strings, so nothing about the rejected credential leaks back.

/// Reason given for every failed credential check
pub const REASON_AUTHENTICATION_FAILED: &str = "authentication failed";

/// Reason given when credential material cannot be parsed
pub const REASON_INVALID_CREDENTIALS: &str = "invalid credential format";

/// Reason given when the session disappeared mid-handshake
pub const REASON_SESSION_CLOSED: &str = "session closed";

/// Authentication errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthenticationError {
    /// Malformed key or secret material, from configuration or the client
    #[error("Invalid credential format: {0}")]
    InvalidCredentialFormat(String),

    /// The delegated remote call failed, timed out or was rejected
    #[error("Authenticator unavailable: {0}")]
    AuthenticatorUnavailable(String),

    /// Signature, HMAC or ticket did not match
    #[error("Verification failed")]
    VerificationFailed,

    /// Operation invoked out of order or on a method that does not support it
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    /// The session went away while a delegated call was outstanding
    #[error("Session closed")]
    SessionClosed,
}

impl AuthenticationError {
    /// Whether this error must propagate instead of becoming a `Deny`
    pub fn is_hard(&self) -> bool {
        matches!(self, AuthenticationError::ProtocolViolation(_))
    }

    /// Fixed, non-identifying reason to put in the `Deny`
    pub fn deny_reason(&self) -> &'static str {
        match self {
            AuthenticationError::InvalidCredentialFormat(_) => REASON_INVALID_CREDENTIALS,
            AuthenticationError::SessionClosed => REASON_SESSION_CLOSED,
            AuthenticationError::AuthenticatorUnavailable(_)
            | AuthenticationError::VerificationFailed
            | AuthenticationError::ProtocolViolation(_) => REASON_AUTHENTICATION_FAILED,
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidCredentialFormat(message.into())
    }

    pub(crate) fn unavailable(message: impl Into<String>) -> Self {
        Self::AuthenticatorUnavailable(message.into())
    }

    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        Self::ProtocolViolation(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_protocol_violation_is_hard() {
        assert!(AuthenticationError::protocol("authenticate before hello").is_hard());
        assert!(!AuthenticationError::VerificationFailed.is_hard());
        assert!(!AuthenticationError::unavailable("timeout").is_hard());
        assert!(!AuthenticationError::invalid("bad hex").is_hard());
        assert!(!AuthenticationError::SessionClosed.is_hard());
    }

    #[test]
    fn test_unavailable_authenticator_reason() {
        assert_eq!(
            AuthenticationError::unavailable("connection refused").deny_reason(),
            "authentication failed"
        );
    }
}

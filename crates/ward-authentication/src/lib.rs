//! Ward Authentication
//!
//! Per-session handshake state machines that establish who a client is and
//! which role it gets. One variant exists per credential method:
//!
//! | Method       | HELLO                        | AUTHENTICATE                   |
//! |--------------|------------------------------|--------------------------------|
//! | `anonymous`  | accept                       | -                              |
//! | `ticket`     | empty challenge              | compare ticket                 |
//! | `wampcra`    | HMAC challenge               | compare HMAC in constant time  |
//! | `cryptosign` | random nonce                 | verify Ed25519 signature       |
//! | `tls`        | accept (transport verified)  | -                              |
//!
//! Each method is configured either `static` (credentials in configuration) or
//! `dynamic` (a remote authenticator procedure resolves them). The dynamic
//! case goes through `DynamicAuthenticator`, the only place a handshake can
//! suspend.
//!
//! Failures never escape as errors except `ProtocolViolation`: everything
//! else becomes `AuthResult::Deny` with a reason that reveals nothing about
//! the credential.

pub mod authenticator;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod outcome;
pub mod pending;

pub use authenticator::{AuthenticatorResponse, DynamicAuthenticator, KeyDerivation};
pub use config::{AuthConfig, DynamicConfig, SecretString};
pub use errors::AuthenticationError;
pub use outcome::{Accept, AuthProvider, AuthResult, Challenge, Deny, HelloDetails};
pub use pending::{
    AuthEffects, AuthState, PendingAuth, PendingAuthAnonymous, PendingAuthCryptosign,
    PendingAuthTicket, PendingAuthTls, PendingAuthWampCra,
};

pub use ward_core::{AuthMethod, JsonMap, SessionContext, WardError};

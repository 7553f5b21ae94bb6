//! Configuration traits and validation
//!
//! Configuration reaches the auth core already parsed into `serde_json::Value`
//! mappings; loading from files or the command line happens elsewhere. Types
//! built from configuration implement `ConfigValidation` so structural
//! mistakes are rejected when a role or handshake is constructed.

pub mod validation;

pub use validation::{ConfigValidator, ValidationError, ValidationResult};

use crate::WardError;

/// Trait for configuration validation
pub trait ConfigValidation {
    /// Validate this configuration
    fn validate(&self) -> Result<(), WardError>;
}

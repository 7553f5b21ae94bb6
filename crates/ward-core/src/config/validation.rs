//! Configuration validation utilities and rules

use crate::WardError;
use std::fmt;

/// Configuration validation result
pub type ValidationResult = Result<(), ValidationError>;

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Value is required but missing or empty
    Required {
        /// Dotted path of the field
        field: String,
    },
    /// Value format is invalid
    InvalidFormat {
        /// Dotted path of the field
        field: String,
        /// Description of an acceptable value
        expected: String,
        /// Value that was found
        actual: String,
    },
    /// Custom validation failed
    Custom {
        /// Dotted path of the field
        field: String,
        /// What the rule requires
        message: String,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Required { field } => {
                write!(f, "Field '{field}' is required but missing")
            }
            ValidationError::InvalidFormat {
                field,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Field '{field}' has invalid format. Expected: {expected}, got: {actual}"
                )
            }
            ValidationError::Custom { field, message } => {
                write!(f, "Field '{field}': {message}")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for WardError {
    fn from(err: ValidationError) -> Self {
        WardError::invalid(err.to_string())
    }
}

/// Configuration validator that accumulates validation rules
#[derive(Debug, Default)]
pub struct ConfigValidator {
    errors: Vec<ValidationError>,
    field_prefix: String,
}

impl ConfigValidator {
    /// Create a new validator
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a validator for a nested field
    pub fn for_field(&self, field_name: &str) -> Self {
        Self {
            errors: Vec::new(),
            field_prefix: self.full_field_name(field_name),
        }
    }

    /// Validate that a string is present and not empty
    pub fn non_empty(&mut self, field_name: &str, value: &str) -> &mut Self {
        if value.is_empty() {
            self.errors.push(ValidationError::Required {
                field: self.full_field_name(field_name),
            });
        }
        self
    }

    /// Validate that a string does not contain a forbidden character
    pub fn excludes(&mut self, field_name: &str, value: &str, forbidden: char) -> &mut Self {
        if value.contains(forbidden) {
            self.errors.push(ValidationError::InvalidFormat {
                field: self.full_field_name(field_name),
                expected: format!("no '{forbidden}'"),
                actual: value.to_string(),
            });
        }
        self
    }

    /// Validate using a custom predicate
    pub fn custom<T, F>(&mut self, field_name: &str, value: &T, predicate: F, message: &str) -> &mut Self
    where
        F: FnOnce(&T) -> bool,
    {
        if !predicate(value) {
            self.errors.push(ValidationError::Custom {
                field: self.full_field_name(field_name),
                message: message.to_string(),
            });
        }
        self
    }

    /// Merge errors from another validator
    pub fn merge(&mut self, other: ConfigValidator) {
        self.errors.extend(other.errors);
    }

    /// Get validation result, reporting the first error found
    pub fn result(self) -> ValidationResult {
        match self.errors.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn full_field_name(&self, field_name: &str) -> String {
        if self.field_prefix.is_empty() {
            field_name.to_string()
        } else {
            format!("{}.{}", self.field_prefix, field_name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_validator_passes() {
        assert!(ConfigValidator::new().result().is_ok());
    }

    #[test]
    fn test_nested_field_names() {
        let root = ConfigValidator::new();
        let mut rules = root.for_field("permissions[2]");
        rules.non_empty("uri", "");

        assert_eq!(
            rules.result(),
            Err(ValidationError::Required {
                field: "permissions[2].uri".to_string()
            })
        );
    }

    #[test]
    fn test_first_error_is_reported() {
        let mut validator = ConfigValidator::new();
        validator
            .non_empty("role", "")
            .excludes("uri", "com.*.foo", '*')
            .custom("keylen", &0u32, |v| *v > 0, "must be positive");

        let err = validator.result().unwrap_err();
        assert!(matches!(err, ValidationError::Required { .. }));
        assert_eq!(
            WardError::from(err).to_string(),
            "Invalid: Field 'role' is required but missing"
        );
    }
}

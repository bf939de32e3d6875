//! Error types for the codec and the schema validator.
//!
//! Two families of errors exist, and they never mix:
//!
//! - [`ParamError`] — a *recoverable* field-level decode problem (a raw
//!   string that cannot become the declared type, multiple raw values for
//!   a scalar field, or a converted value rejected by the field's schema).
//!   The codec recovers from these locally: the field is omitted, or its
//!   default is substituted. They are surfaced only through debug logs,
//!   never as a `Result` from [`decode`](crate::codec::decode).
//! - [`ValidationError`] — a structural mismatch reported by
//!   [`Schema::validate`](crate::schema::Schema::validate) and
//!   [`ObjectSchema::validate_partial`](crate::schema::ObjectSchema::validate_partial)
//!   for callers that hold a candidate object rather than a query string.
//!
//! Calling the codec with an unsupported top-level schema shape is a
//! caller bug, not bad input; it panics instead of producing either type.
//!
//! # Examples
//!
//! ```
//! use query_state::ParamError;
//!
//! let err = ParamError::multiplicity("page", 2);
//! assert_eq!(err.field(), "page");
//! assert_eq!(err.to_string(), "multiple values for non-array field 'page'");
//! ```

use thiserror::Error;

/// Recoverable field-level decode error.
///
/// Produced while converting raw query-string values into typed values.
/// The codec never propagates these to its caller; inside a union variant
/// attempt they reject that variant, everywhere else the field is omitted
/// or falls back to its default.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    /// A raw string could not be converted to the declared scalar type.
    #[error("invalid {expected} value for field '{field}': {value:?}")]
    Convert {
        /// Field name as declared in the schema.
        field: String,
        /// Human-readable name of the expected type.
        expected: &'static str,
        /// The offending raw string.
        value: String,
    },

    /// More than one raw value was supplied for a non-array field.
    #[error("multiple values for non-array field '{field}'")]
    Multiplicity {
        /// Field name as declared in the schema.
        field: String,
        /// Number of raw values found.
        count: usize,
    },

    /// A converted value was rejected by the field's own schema.
    #[error("converted value for field '{field}' failed schema validation")]
    Validation {
        /// Field name as declared in the schema.
        field: String,
    },
}

impl ParamError {
    /// Create a conversion error.
    pub fn convert(
        field: impl Into<String>,
        expected: &'static str,
        value: impl Into<String>,
    ) -> Self {
        Self::Convert {
            field: field.into(),
            expected,
            value: value.into(),
        }
    }

    /// Create a multiplicity error.
    pub fn multiplicity(field: impl Into<String>, count: usize) -> Self {
        Self::Multiplicity {
            field: field.into(),
            count,
        }
    }

    /// Create a validation error.
    pub fn validation(field: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
        }
    }

    /// Name of the field the error applies to.
    pub fn field(&self) -> &str {
        match self {
            Self::Convert { field, .. }
            | Self::Multiplicity { field, .. }
            | Self::Validation { field } => field,
        }
    }
}

/// Structural validation error reported by the schema validator.
///
/// `field` is the declared field name, or `"."` for a top-level mismatch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Field the error applies to (`"."` for the value itself).
    pub field: String,
    /// What went wrong.
    pub message: String,
}

impl ValidationError {
    /// Create a validation error for a named field.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a validation error for the value itself rather than a field.
    pub fn top_level(message: impl Into<String>) -> Self {
        Self::new(".", message)
    }
}

//! Error types for schema construction.

use thiserror::Error;

/// Result type for schema construction.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised while building a [`FormSchema`](crate::FormSchema).
///
/// Validation itself never fails with this type; non-conforming candidate
/// values are reported as [`FieldErrors`](crate::FieldErrors).
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Two fields share a name.
    #[error("duplicate field: {0}")]
    DuplicateField(String),

    /// A field uses the reserved whole-form key.
    #[error("reserved field name: {0}")]
    ReservedField(String),

    /// The schema has no fields.
    #[error("schema has no fields")]
    EmptySchema,

    /// A pattern constraint could not be compiled.
    #[error("invalid pattern for field {field}: {reason}")]
    InvalidPattern { field: String, reason: String },
}

//! Declarative form schemas for formkit.
//!
//! A schema is data, not code: every field is a [`FieldSpec`] holding a kind
//! tag and an ordered list of [`Constraint`]s, and one generic validator walks
//! that list for every field. This crate defines:
//! - [`FieldKind`] / [`FieldSpec`] — a field's primitive type and its rules
//! - [`Constraint`] — a single (predicate, message) rule
//! - [`FormSchema`] — the immutable, ordered set of fields with `validate`
//! - [`FieldErrors`] / [`ValidatedValues`] — the two outcomes of validation
//! - [`FormRecord`] — ties a typed record to the schema that produces it
//! - [`signup_schema`] / [`SignupRecord`] — the built-in email + password form
//!
//! # Validation policy
//!
//! Validation is pure, synchronous and total. Fields are checked
//! independently. For each field, every failing constraint contributes its
//! message in declaration order; consumers that show one message per field
//! use the first one ([`FieldErrors::first`]).

mod constraint;
mod error;
mod field;
mod schema;
mod signup;

pub use constraint::{is_email, Constraint, Predicate};
pub use error::{SchemaError, SchemaResult};
pub use field::{FieldKind, FieldSpec};
pub use schema::{
    FieldErrors, FormRecord, FormSchema, FormSchemaBuilder, ValidatedValues, ROOT_ERROR_KEY,
};
pub use signup::{
    signup_schema, SignupRecord, EMAIL_FIELD, INVALID_EMAIL, PASSWORD_FIELD,
    PASSWORD_MIN_LENGTH, PASSWORD_TOO_SHORT,
};

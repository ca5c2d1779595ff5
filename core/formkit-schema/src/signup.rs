//! The built-in signup form: an email identifier and a password secret.

use crate::field::FieldSpec;
use crate::schema::{FormRecord, FormSchema};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, LazyLock};

pub const EMAIL_FIELD: &str = "email";
pub const PASSWORD_FIELD: &str = "password";

pub const INVALID_EMAIL: &str = "invalid email";
pub const PASSWORD_MIN_LENGTH: usize = 8;
pub const PASSWORD_TOO_SHORT: &str = "minimum length 8";

static SIGNUP_SCHEMA: LazyLock<Arc<FormSchema>> = LazyLock::new(|| {
    Arc::new(FormSchema::from_fields(vec![
        FieldSpec::string(EMAIL_FIELD)
            .type_message(INVALID_EMAIL)
            .email(INVALID_EMAIL),
        FieldSpec::string(PASSWORD_FIELD).min_length(PASSWORD_MIN_LENGTH, PASSWORD_TOO_SHORT),
    ]))
});

/// Returns the shared signup schema.
pub fn signup_schema() -> Arc<FormSchema> {
    Arc::clone(&SIGNUP_SCHEMA)
}

/// A signup submission that passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupRecord {
    pub email: String,
    pub password: String,
}

impl FormRecord for SignupRecord {
    fn schema() -> Arc<FormSchema> {
        signup_schema()
    }
}

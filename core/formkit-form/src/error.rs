//! Error types for the form layer.

use thiserror::Error;

/// Result type for form operations.
pub type FormResult<T> = Result<T, FormError>;

/// Errors raised by the form controller and its configuration.
///
/// Validation failures and handler rejections are not errors here: they are
/// recorded in the form's error map and reported as a
/// [`SubmitOutcome`](crate::SubmitOutcome).
#[derive(Debug, Error)]
pub enum FormError {
    /// The schema does not declare this field.
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// Reading a configuration file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration file is not valid TOML for [`FormConfig`](crate::FormConfig).
    #[error("TOML deserialization error: {0}")]
    Config(#[from] toml::de::Error),
}

/// Failure reported by a [`SubmissionHandler`](crate::SubmissionHandler).
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// An expected business failure, attributed to a field or to `"root"`.
    #[error("{field}: {message}")]
    Rejected { field: String, message: String },

    /// Anything the handler did not turn into a rejection.
    #[error("unexpected submission failure: {0}")]
    Unexpected(#[from] anyhow::Error),
}

impl SubmissionError {
    /// A rejection attributed to `field`.
    pub fn rejected(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rejected {
            field: field.into(),
            message: message.into(),
        }
    }

    /// A rejection attributed to the whole form.
    pub fn root(message: impl Into<String>) -> Self {
        Self::rejected(formkit_schema::ROOT_ERROR_KEY, message)
    }
}

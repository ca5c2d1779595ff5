//! Form state and submission for formkit.
//!
//! Governs a single form instance from keystroke to settled submission:
//! - [`FormController`] — holds raw values, errors and the submission flag;
//!   validates against a [`FormSchema`](formkit_schema::FormSchema) on submit
//! - [`SubmissionHandler`] — the async operation run with the typed record
//! - [`FormView`] — render model (inputs, error texts, submit control)
//! - [`FormConfig`] — default values and the unexpected-failure policy
//!
//! # Submission lifecycle
//!
//! 1. Input events store raw values; nothing is validated yet.
//! 2. A submit attempt while another is in flight is dropped.
//! 3. Otherwise the values are validated. Failures replace the error map and
//!    the handler is not called.
//! 4. On success errors are cleared, the form enters `Submitting`, and the
//!    handler runs with the typed record.
//! 5. When the handler settles the form returns to `Idle`; a rejection lands
//!    on the field the handler names.
//!
//! # Example
//!
//! ```
//! use formkit_form::{FormConfig, FormController, SubmissionError, SubmitOutcome};
//! use formkit_schema::SignupRecord;
//!
//! # tokio_test::block_on(async {
//! let form = FormController::<SignupRecord>::for_record(
//!     FormConfig::default().with_default("email", "test@email.com"),
//! )
//! .unwrap();
//! form.set_value("password", "longenough").unwrap();
//!
//! let handler = |record: SignupRecord| async move {
//!     assert_eq!(record.email, "test@email.com");
//!     Ok::<(), SubmissionError>(())
//! };
//! assert_eq!(form.submit(&handler).await, SubmitOutcome::Submitted);
//! # });
//! ```

mod config;
mod controller;
mod error;
mod handler;
mod state;
pub mod view;

pub use config::{FormConfig, UnexpectedFailurePolicy};
pub use controller::{FieldBinding, FormController, SubmitOutcome};
pub use error::{FormError, FormResult, SubmissionError};
pub use handler::SubmissionHandler;
pub use state::{FormErrors, FormId, FormSnapshot, FormValues, SubmissionState};
pub use view::{FormEvent, FormView, InputKind, RenderedForm};

//! Form state controller: one form instance's values, errors and
//! submission flag.
//!
//! All state lives in a single `watch` channel owned by the controller.
//! Mutations are short synchronous `send_modify` calls: no lock is held
//! across an await point or while validation runs, and views can
//! `subscribe` to re-render on change. The only suspension point is the
//! submission handler.

use crate::config::{FormConfig, UnexpectedFailurePolicy};
use crate::error::{FormError, FormResult, SubmissionError};
use crate::handler::SubmissionHandler;
use crate::state::{FormErrors, FormId, FormSnapshot, FormValues, SubmissionState};
use crate::view::FormEvent;
use formkit_schema::{FieldErrors, FormRecord, FormSchema, ROOT_ERROR_KEY};
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, info_span, warn, Instrument};

/// What a call to [`FormController::submit`] did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// Another submission was in flight; nothing happened.
    Ignored,
    /// Validation failed; the handler was not called.
    Invalid { errors: FieldErrors },
    /// The handler completed successfully.
    Submitted,
    /// The handler rejected the submission on `field`.
    Rejected { field: String, message: String },
    /// The handler failed unexpectedly. `surfaced` tells whether the message
    /// was written to the root error slot.
    Failed { message: String, surfaced: bool },
}

enum Begin<T> {
    Busy,
    Invalid(FieldErrors),
    Ready(T),
}

/// Handle to one form instance. Clones share the same state.
pub struct FormController<T> {
    id: FormId,
    schema: Arc<FormSchema>,
    policy: UnexpectedFailurePolicy,
    state: Arc<watch::Sender<FormSnapshot>>,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for FormController<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            schema: Arc::clone(&self.schema),
            policy: self.policy,
            state: Arc::clone(&self.state),
            _record: PhantomData,
        }
    }
}

impl<T> fmt::Debug for FormController<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormController")
            .field("id", &self.id)
            .field("policy", &self.policy)
            .field("state", &self.state.borrow().state)
            .finish_non_exhaustive()
    }
}

impl<T: FormRecord> FormController<T> {
    /// Creates a form for a record type that names its own schema.
    pub fn for_record(config: FormConfig) -> FormResult<Self> {
        Self::new(T::schema(), config)
    }
}

impl<T> FormController<T>
where
    T: DeserializeOwned + Send + 'static,
{
    /// Creates a form with every declared field empty, then applies the
    /// configured default values.
    pub fn new(schema: Arc<FormSchema>, config: FormConfig) -> FormResult<Self> {
        let mut values: FormValues = schema
            .field_names()
            .map(|name| (name.to_string(), String::new()))
            .collect();
        for (field, value) in config.default_values {
            if !schema.contains(&field) {
                return Err(FormError::UnknownField(field));
            }
            values.insert(field, value);
        }

        let id = FormId::new();
        let (tx, _rx) = watch::channel(FormSnapshot::new(id, values));
        debug!(form_id = %id, fields = schema.fields().len(), "form created");

        Ok(Self {
            id,
            schema,
            policy: config.unexpected_failure,
            state: Arc::new(tx),
            _record: PhantomData,
        })
    }

    pub fn id(&self) -> FormId {
        self.id
    }

    pub fn schema(&self) -> &Arc<FormSchema> {
        &self.schema
    }

    /// Copies the current state.
    pub fn snapshot(&self) -> FormSnapshot {
        self.state.borrow().clone()
    }

    /// Receives a fresh snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<FormSnapshot> {
        self.state.subscribe()
    }

    pub fn values(&self) -> FormValues {
        self.state.borrow().values.clone()
    }

    pub fn value(&self, field: &str) -> Option<String> {
        self.state.borrow().value(field).map(str::to_string)
    }

    pub fn errors(&self) -> FormErrors {
        self.state.borrow().errors.clone()
    }

    pub fn error(&self, field: &str) -> Option<String> {
        self.state.borrow().error(field).map(str::to_string)
    }

    pub fn root_error(&self) -> Option<String> {
        self.error(ROOT_ERROR_KEY)
    }

    pub fn state(&self) -> SubmissionState {
        self.state.borrow().state
    }

    pub fn is_submitting(&self) -> bool {
        self.state().is_submitting()
    }

    // ── Field access ─────────────────────────────────────────────

    /// Binds a declared field: its current value and a setter.
    pub fn bind(&self, field: &str) -> FormResult<FieldBinding> {
        self.ensure_field(field)?;
        let value = self.state.borrow().value(field).unwrap_or_default().to_string();
        Ok(FieldBinding {
            field: field.to_string(),
            value,
            state: Arc::clone(&self.state),
        })
    }

    /// Stores a raw value. Errors already shown for the field stay until the
    /// next submit attempt or an explicit [`set_field_error`](Self::set_field_error).
    pub fn set_value(&self, field: &str, value: impl Into<String>) -> FormResult<()> {
        self.ensure_field(field)?;
        write_value(&self.state, field, value.into());
        Ok(())
    }

    /// Overwrites the error of one field (or of `"root"`). Leaves the
    /// submission state and every other error untouched.
    pub fn set_field_error(&self, field: &str, message: impl Into<String>) -> FormResult<()> {
        if field != ROOT_ERROR_KEY {
            self.ensure_field(field)?;
        }
        let message = message.into();
        debug!(form_id = %self.id, field, "field error set");
        self.state.send_modify(|s| {
            s.errors.insert(field.to_string(), message);
        });
        Ok(())
    }

    pub fn clear_errors(&self) {
        self.state.send_if_modified(|s| {
            let changed = !s.errors.is_empty();
            s.errors.clear();
            changed
        });
    }

    // ── Submission ───────────────────────────────────────────────

    /// Validates the current values and, if they conform, runs `handler`
    /// with the typed record.
    ///
    /// While a submission is in flight every further call returns
    /// [`SubmitOutcome::Ignored`] without validating. The in-flight flag is
    /// cleared when the handler settles, whatever the result, and also if
    /// this future is dropped before that.
    pub async fn submit<H>(&self, handler: &H) -> SubmitOutcome
    where
        H: SubmissionHandler<T> + ?Sized,
    {
        let span = info_span!("submit", form_id = %self.id);
        self.run_submit(handler).instrument(span).await
    }

    /// Applies one event produced by a view.
    pub async fn handle_event<H>(&self, event: FormEvent, handler: &H) -> FormResult<Option<SubmitOutcome>>
    where
        H: SubmissionHandler<T> + ?Sized,
    {
        match event {
            FormEvent::Input { field, value } => {
                self.set_value(&field, value)?;
                Ok(None)
            }
            FormEvent::Submit => Ok(Some(self.submit(handler).await)),
        }
    }

    /// Resolves once no submission is in flight.
    pub async fn wait_idle(&self) {
        let mut rx = self.state.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|s| !s.state.is_submitting()).await;
    }

    async fn run_submit<H>(&self, handler: &H) -> SubmitOutcome
    where
        H: SubmissionHandler<T> + ?Sized,
    {
        let record = match self.begin_submit() {
            Begin::Busy => {
                debug!("submission in flight, attempt ignored");
                return SubmitOutcome::Ignored;
            }
            Begin::Invalid(errors) => {
                debug!(fields = errors.len(), "submission blocked by validation");
                return SubmitOutcome::Invalid { errors };
            }
            Begin::Ready(record) => record,
        };

        let guard = SubmittingGuard {
            state: &self.state,
            armed: true,
        };
        info!("submission started");

        match AssertUnwindSafe(handler.submit(record)).catch_unwind().await {
            Ok(Ok(())) => {
                guard.settle(|_| {});
                info!("submission settled");
                SubmitOutcome::Submitted
            }
            Ok(Err(SubmissionError::Rejected { field, message })) => {
                let field = if field == ROOT_ERROR_KEY || self.schema.contains(&field) {
                    field
                } else {
                    warn!(field = %field, "rejection names an unknown field, using root");
                    ROOT_ERROR_KEY.to_string()
                };
                warn!(field = %field, "submission rejected");
                guard.settle(|s| {
                    s.errors.insert(field.clone(), message.clone());
                });
                SubmitOutcome::Rejected { field, message }
            }
            Ok(Err(SubmissionError::Unexpected(e))) => {
                let detail = format!("{e:#}");
                warn!(error = %detail, "submission failed unexpectedly");
                self.fail(guard, e.to_string())
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(error = %message, "submission handler panicked");
                self.fail(guard, message)
            }
        }
    }

    /// Validates a copy of the values with no lock held, then re-checks the
    /// flag while committing, so two attempts can never both start.
    fn begin_submit(&self) -> Begin<T> {
        let values = {
            let current = self.state.borrow();
            if current.state.is_submitting() {
                return Begin::Busy;
            }
            current.values.clone()
        };

        // Constraints may read the form through another handle.
        let validated = self
            .schema
            .validate_strings(&values)
            .and_then(|values| values.into_record::<T>());

        let mut begin = Begin::Busy;
        self.state.send_if_modified(|s| {
            if s.state.is_submitting() {
                return false;
            }
            match validated {
                Ok(record) => {
                    s.errors.clear();
                    s.state = SubmissionState::Submitting;
                    begin = Begin::Ready(record);
                }
                Err(errors) => {
                    s.errors = errors.first_messages();
                    begin = Begin::Invalid(errors);
                }
            }
            true
        });
        begin
    }

    fn fail(&self, guard: SubmittingGuard<'_>, message: String) -> SubmitOutcome {
        match self.policy {
            UnexpectedFailurePolicy::Swallow => {
                guard.settle(|_| {});
                SubmitOutcome::Failed {
                    message,
                    surfaced: false,
                }
            }
            UnexpectedFailurePolicy::Root => {
                guard.settle(|s| {
                    s.errors.insert(ROOT_ERROR_KEY.to_string(), message.clone());
                });
                SubmitOutcome::Failed {
                    message,
                    surfaced: true,
                }
            }
        }
    }

    fn ensure_field(&self, field: &str) -> FormResult<()> {
        if self.schema.contains(field) {
            Ok(())
        } else {
            Err(FormError::UnknownField(field.to_string()))
        }
    }
}

/// Holds the Submitting flag; releases it exactly once.
struct SubmittingGuard<'a> {
    state: &'a watch::Sender<FormSnapshot>,
    armed: bool,
}

impl SubmittingGuard<'_> {
    /// Returns to `Idle` and applies `f` in the same state change.
    fn settle(mut self, f: impl FnOnce(&mut FormSnapshot)) {
        self.armed = false;
        self.state.send_modify(|s| {
            s.state = SubmissionState::Idle;
            f(s);
        });
    }
}

impl Drop for SubmittingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!("submission dropped before settling");
            self.state.send_modify(|s| s.state = SubmissionState::Idle);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "submission handler panicked".to_string()
    }
}

fn write_value(state: &watch::Sender<FormSnapshot>, field: &str, value: String) {
    let changed = state.send_if_modified(|s| match s.values.get_mut(field) {
        Some(current) if *current == value => false,
        Some(current) => {
            *current = value;
            true
        }
        None => {
            s.values.insert(field.to_string(), value);
            true
        }
    });
    if changed {
        debug!(field, "value changed");
    }
}

/// A field's value at bind time plus its setter.
#[derive(Clone)]
pub struct FieldBinding {
    field: String,
    value: String,
    state: Arc<watch::Sender<FormSnapshot>>,
}

impl FieldBinding {
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Value when the binding was created.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Value now.
    pub fn current(&self) -> String {
        self.state
            .borrow()
            .value(&self.field)
            .unwrap_or_default()
            .to_string()
    }

    /// Stores a new raw value for this field only.
    pub fn on_change(&self, value: impl Into<String>) {
        write_value(&self.state, &self.field, value.into());
    }
}

impl fmt::Debug for FieldBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Values may be secrets.
        f.debug_struct("FieldBinding")
            .field("field", &self.field)
            .finish_non_exhaustive()
    }
}

use async_trait::async_trait;
use formkit_form::{
    FormConfig, FormController, FormError, FormEvent, SubmissionError, SubmissionHandler,
    SubmissionState, SubmitOutcome, UnexpectedFailurePolicy,
};
use formkit_schema::{
    FieldSpec, FormSchema, SignupRecord, EMAIL_FIELD, INVALID_EMAIL, PASSWORD_FIELD,
    PASSWORD_TOO_SHORT, ROOT_ERROR_KEY,
};
use pretty_assertions::assert_eq;
use serde::Deserialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;
use tokio::sync::Notify;
use tokio_test::{assert_pending, assert_ready_eq};

fn signup_form() -> FormController<SignupRecord> {
    FormController::for_record(FormConfig::default()).unwrap()
}

fn filled_form(email: &str, password: &str) -> FormController<SignupRecord> {
    let form = signup_form();
    form.set_value(EMAIL_FIELD, email).unwrap();
    form.set_value(PASSWORD_FIELD, password).unwrap();
    form
}

/// Records every call and resolves with a fixed result.
#[derive(Default)]
struct RecordingHandler {
    calls: Mutex<Vec<SignupRecord>>,
    reject: Option<(String, String)>,
}

impl RecordingHandler {
    fn rejecting(field: &str, message: &str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            reject: Some((field.to_string(), message.to_string())),
        }
    }

    fn calls(&self) -> Vec<SignupRecord> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SubmissionHandler<SignupRecord> for RecordingHandler {
    async fn submit(&self, record: SignupRecord) -> Result<(), SubmissionError> {
        self.calls.lock().unwrap().push(record);
        match &self.reject {
            Some((field, message)) => Err(SubmissionError::rejected(field, message)),
            None => Ok(()),
        }
    }
}

/// Blocks until released, so tests can observe the in-flight state.
#[derive(Default)]
struct GatedHandler {
    calls: AtomicUsize,
    release: Notify,
}

#[async_trait]
impl SubmissionHandler<SignupRecord> for GatedHandler {
    async fn submit(&self, _record: SignupRecord) -> Result<(), SubmissionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.release.notified().await;
        Ok(())
    }
}

// ── Construction ─────────────────────────────────────────────────

#[test]
fn new_form_is_idle_with_empty_fields() {
    let form = signup_form();
    assert_eq!(form.state(), SubmissionState::Idle);
    assert_eq!(form.value(EMAIL_FIELD).as_deref(), Some(""));
    assert_eq!(form.value(PASSWORD_FIELD).as_deref(), Some(""));
    assert!(form.errors().is_empty());
}

#[test]
fn default_values_are_seeded() {
    let form = FormController::<SignupRecord>::for_record(
        FormConfig::default().with_default(EMAIL_FIELD, "test@email.com"),
    )
    .unwrap();
    assert_eq!(form.value(EMAIL_FIELD).as_deref(), Some("test@email.com"));
}

#[test]
fn default_for_unknown_field_is_rejected() {
    let err = FormController::<SignupRecord>::for_record(
        FormConfig::default().with_default("username", "x"),
    )
    .unwrap_err();
    assert!(matches!(err, FormError::UnknownField(ref f) if f == "username"));
}

#[test]
fn clones_share_state() {
    let form = signup_form();
    let other = form.clone();
    other.set_value(EMAIL_FIELD, "a@b.co").unwrap();
    assert_eq!(form.value(EMAIL_FIELD).as_deref(), Some("a@b.co"));
    assert_eq!(form.id(), other.id());
}

// ── Binding ──────────────────────────────────────────────────────

#[test]
fn bind_exposes_value_and_setter() {
    let form = filled_form("test@email.com", "");
    let binding = form.bind(EMAIL_FIELD).unwrap();
    assert_eq!(binding.field(), EMAIL_FIELD);
    assert_eq!(binding.value(), "test@email.com");

    binding.on_change("other@email.com");
    assert_eq!(binding.value(), "test@email.com");
    assert_eq!(binding.current(), "other@email.com");
    assert_eq!(form.value(EMAIL_FIELD).as_deref(), Some("other@email.com"));
    assert_eq!(form.value(PASSWORD_FIELD).as_deref(), Some(""));
}

#[test]
fn bind_unknown_field_fails() {
    let form = signup_form();
    assert!(matches!(form.bind("nope"), Err(FormError::UnknownField(_))));
    assert!(form.set_value("nope", "x").is_err());
}

#[test]
fn binding_debug_hides_value() {
    let form = filled_form("", "hunter2hunter2");
    let binding = form.bind(PASSWORD_FIELD).unwrap();
    assert!(!format!("{binding:?}").contains("hunter2"));
}

// ── Validation gate ──────────────────────────────────────────────

#[tokio::test]
async fn bad_email_blocks_submission() {
    let form = filled_form("bad-email", "longpassword");
    let handler = RecordingHandler::default();

    let outcome = form.submit(&handler).await;

    assert!(matches!(outcome, SubmitOutcome::Invalid { .. }));
    assert_eq!(form.error(EMAIL_FIELD).as_deref(), Some(INVALID_EMAIL));
    assert_eq!(form.errors().len(), 1);
    assert!(handler.calls().is_empty());
    assert_eq!(form.state(), SubmissionState::Idle);
}

#[tokio::test]
async fn short_password_blocks_submission() {
    let form = filled_form("test@email.com", "short");
    let handler = RecordingHandler::default();

    form.submit(&handler).await;

    assert_eq!(form.error(PASSWORD_FIELD).as_deref(), Some(PASSWORD_TOO_SHORT));
    assert_eq!(form.errors().len(), 1);
    assert!(handler.calls().is_empty());
}

#[tokio::test]
async fn valid_submission_calls_handler_with_record() {
    let form = filled_form("test@email.com", "longenough");
    let handler = RecordingHandler::default();

    let outcome = form.submit(&handler).await;

    assert_eq!(outcome, SubmitOutcome::Submitted);
    assert_eq!(
        handler.calls(),
        vec![SignupRecord {
            email: "test@email.com".into(),
            password: "longenough".into(),
        }]
    );
    assert_eq!(form.state(), SubmissionState::Idle);
    assert!(form.errors().is_empty());
}

#[tokio::test]
async fn errors_persist_across_edits_until_next_submit() {
    let form = filled_form("bad-email", "longpassword");
    let handler = RecordingHandler::default();
    form.submit(&handler).await;

    form.set_value(EMAIL_FIELD, "test@email.com").unwrap();
    assert_eq!(form.error(EMAIL_FIELD).as_deref(), Some(INVALID_EMAIL));

    assert_eq!(form.submit(&handler).await, SubmitOutcome::Submitted);
    assert!(form.errors().is_empty());
}

#[tokio::test]
async fn failed_validation_replaces_previous_errors() {
    let form = filled_form("bad-email", "longpassword");
    let handler = RecordingHandler::default();
    form.set_field_error(ROOT_ERROR_KEY, "stale").unwrap();

    form.submit(&handler).await;

    assert_eq!(form.root_error(), None);
    assert_eq!(form.error(EMAIL_FIELD).as_deref(), Some(INVALID_EMAIL));
}

// ── Re-entrancy ──────────────────────────────────────────────────

#[tokio::test]
async fn second_submit_while_in_flight_is_ignored() {
    let form = filled_form("test@email.com", "longenough");
    let handler = GatedHandler::default();

    let mut first = tokio_test::task::spawn(form.submit(&handler));
    assert_pending!(first.poll());
    assert!(form.is_submitting());

    assert_eq!(form.submit(&handler).await, SubmitOutcome::Ignored);
    assert_eq!(handler.calls.load(Ordering::SeqCst), 1);

    handler.release.notify_one();
    assert_ready_eq!(first.poll(), SubmitOutcome::Submitted);
    assert_eq!(form.state(), SubmissionState::Idle);
    assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn concurrent_submits_invoke_handler_once() {
    let form = filled_form("test@email.com", "longenough");
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let handler = move |_record: SignupRecord| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(1000)).await;
            Ok::<(), SubmissionError>(())
        }
    };

    let (a, b) = tokio::join!(form.submit(&handler), form.submit(&handler));

    assert_eq!(a, SubmitOutcome::Submitted);
    assert_eq!(b, SubmitOutcome::Ignored);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!form.is_submitting());
}

#[tokio::test]
async fn ignored_submit_does_not_revalidate() {
    let form = filled_form("test@email.com", "longenough");
    let handler = GatedHandler::default();

    let mut first = tokio_test::task::spawn(form.submit(&handler));
    assert_pending!(first.poll());

    form.set_value(EMAIL_FIELD, "bad-email").unwrap();
    assert_eq!(form.submit(&handler).await, SubmitOutcome::Ignored);
    assert!(form.errors().is_empty());

    handler.release.notify_one();
    assert_ready_eq!(first.poll(), SubmitOutcome::Submitted);
}

#[tokio::test]
async fn dropping_in_flight_submit_releases_flag() {
    let form = filled_form("test@email.com", "longenough");
    let handler = GatedHandler::default();

    let mut first = tokio_test::task::spawn(form.submit(&handler));
    assert_pending!(first.poll());
    assert!(form.is_submitting());
    drop(first);

    assert_eq!(form.state(), SubmissionState::Idle);
}

#[tokio::test]
async fn set_field_error_does_not_touch_submission_state() {
    let form = filled_form("test@email.com", "longenough");
    let handler = GatedHandler::default();

    let mut first = tokio_test::task::spawn(form.submit(&handler));
    assert_pending!(first.poll());

    form.set_field_error(PASSWORD_FIELD, "checked elsewhere").unwrap();
    assert!(form.is_submitting());

    handler.release.notify_one();
    assert_ready_eq!(first.poll(), SubmitOutcome::Submitted);
    assert_eq!(form.error(PASSWORD_FIELD).as_deref(), Some("checked elsewhere"));
}

#[test]
fn writing_the_same_value_does_not_notify() {
    let form = filled_form("test@email.com", "");
    let rx = form.subscribe();

    form.set_value(EMAIL_FIELD, "test@email.com").unwrap();
    assert!(!rx.has_changed().unwrap());

    form.bind(EMAIL_FIELD).unwrap().on_change("other@email.com");
    assert!(rx.has_changed().unwrap());
}

#[test]
fn clear_errors_keeps_values() {
    let form = filled_form("test@email.com", "longenough");
    form.set_field_error(EMAIL_FIELD, "taken").unwrap();
    form.set_field_error(ROOT_ERROR_KEY, "offline").unwrap();

    form.clear_errors();

    assert!(form.errors().is_empty());
    assert_eq!(form.value(EMAIL_FIELD).as_deref(), Some("test@email.com"));
}

// ── Rejections ───────────────────────────────────────────────────

#[tokio::test]
async fn rejection_lands_on_named_field() {
    let form = filled_form("test@email.com", "longenough");
    let handler = RecordingHandler::rejecting(EMAIL_FIELD, "this email is already taken");

    let outcome = form.submit(&handler).await;

    assert_eq!(
        outcome,
        SubmitOutcome::Rejected {
            field: EMAIL_FIELD.into(),
            message: "this email is already taken".into(),
        }
    );
    assert_eq!(form.error(EMAIL_FIELD).as_deref(), Some("this email is already taken"));
    assert_eq!(form.errors().len(), 1);
    assert_eq!(form.state(), SubmissionState::Idle);
}

#[tokio::test]
async fn rejection_leaves_other_errors_alone() {
    let form = filled_form("test@email.com", "longenough");
    let controller = form.clone();
    let handler = move |_record: SignupRecord| {
        let controller = controller.clone();
        async move {
            if let Err(e) = controller.set_field_error(PASSWORD_FIELD, "password seen in a breach") {
                return Err(SubmissionError::Unexpected(e.into()));
            }
            Err::<(), _>(SubmissionError::rejected(EMAIL_FIELD, "this email is already taken"))
        }
    };

    form.submit(&handler).await;

    assert_eq!(form.error(EMAIL_FIELD).as_deref(), Some("this email is already taken"));
    assert_eq!(form.error(PASSWORD_FIELD).as_deref(), Some("password seen in a breach"));
}

#[tokio::test]
async fn rejection_on_root() {
    let form = filled_form("test@email.com", "longenough");
    let handler = |_record: SignupRecord| async { Err::<(), _>(SubmissionError::root("service unavailable")) };

    form.submit(&handler).await;

    assert_eq!(form.root_error().as_deref(), Some("service unavailable"));
}

#[tokio::test]
async fn rejection_on_unknown_field_falls_back_to_root() {
    let form = filled_form("test@email.com", "longenough");
    let handler = RecordingHandler::rejecting("username", "taken");

    let outcome = form.submit(&handler).await;

    assert_eq!(
        outcome,
        SubmitOutcome::Rejected {
            field: ROOT_ERROR_KEY.into(),
            message: "taken".into(),
        }
    );
    assert_eq!(form.root_error().as_deref(), Some("taken"));
}

// ── Unexpected failures ──────────────────────────────────────────

#[tokio::test]
async fn unexpected_failure_is_swallowed_by_default() {
    let form = filled_form("test@email.com", "longenough");
    let handler = |_record: SignupRecord| async {
        Err::<(), _>(SubmissionError::Unexpected(anyhow::anyhow!("connection reset")))
    };

    let outcome = form.submit(&handler).await;

    assert_eq!(
        outcome,
        SubmitOutcome::Failed {
            message: "connection reset".into(),
            surfaced: false,
        }
    );
    assert!(form.errors().is_empty());
    assert_eq!(form.state(), SubmissionState::Idle);
}

#[tokio::test]
async fn unexpected_failure_can_surface_on_root() {
    let form = FormController::<SignupRecord>::for_record(
        FormConfig::default().with_unexpected_failure(UnexpectedFailurePolicy::Root),
    )
    .unwrap();
    form.set_value(EMAIL_FIELD, "test@email.com").unwrap();
    form.set_value(PASSWORD_FIELD, "longenough").unwrap();
    let handler = |_record: SignupRecord| async {
        Err::<(), _>(SubmissionError::Unexpected(anyhow::anyhow!("connection reset")))
    };

    let outcome = form.submit(&handler).await;

    assert!(matches!(outcome, SubmitOutcome::Failed { surfaced: true, .. }));
    assert_eq!(form.root_error().as_deref(), Some("connection reset"));
}

#[tokio::test]
async fn panicking_handler_does_not_leave_form_stuck() {
    let form = filled_form("test@email.com", "longenough");
    let handler = |_record: SignupRecord| async {
        if true {
            panic!("handler bug");
        }
        Ok::<(), SubmissionError>(())
    };

    let outcome = form.submit(&handler).await;

    assert_eq!(
        outcome,
        SubmitOutcome::Failed {
            message: "handler bug".into(),
            surfaced: false,
        }
    );
    assert_eq!(form.state(), SubmissionState::Idle);

    let ok = RecordingHandler::default();
    assert_eq!(form.submit(&ok).await, SubmitOutcome::Submitted);
}

// ── Events and observation ───────────────────────────────────────

#[tokio::test]
async fn handle_event_routes_input_and_submit() {
    let form = signup_form();
    let handler = RecordingHandler::default();

    let input = form
        .handle_event(FormEvent::input(EMAIL_FIELD, "test@email.com"), &handler)
        .await
        .unwrap();
    assert_eq!(input, None);
    form.handle_event(FormEvent::input(PASSWORD_FIELD, "longenough"), &handler)
        .await
        .unwrap();

    let submit = form.handle_event(FormEvent::Submit, &handler).await.unwrap();
    assert_eq!(submit, Some(SubmitOutcome::Submitted));
    assert_eq!(handler.calls().len(), 1);
}

#[tokio::test]
async fn handle_event_rejects_unknown_field() {
    let form = signup_form();
    let handler = RecordingHandler::default();
    let err = form
        .handle_event(FormEvent::input("nope", "x"), &handler)
        .await
        .unwrap_err();
    assert!(matches!(err, FormError::UnknownField(_)));
}

#[tokio::test]
async fn subscribers_see_submitting_then_idle() {
    let form = filled_form("test@email.com", "longenough");
    let handler = GatedHandler::default();
    let mut rx = form.subscribe();

    let mut first = tokio_test::task::spawn(form.submit(&handler));
    assert_pending!(first.poll());
    assert!(rx.has_changed().unwrap());
    assert_eq!(rx.borrow_and_update().state, SubmissionState::Submitting);

    handler.release.notify_one();
    assert_ready_eq!(first.poll(), SubmitOutcome::Submitted);
    assert_eq!(rx.borrow_and_update().state, SubmissionState::Idle);
}

#[tokio::test(start_paused = true)]
async fn wait_idle_resolves_after_settlement() {
    let form = filled_form("test@email.com", "longenough");
    let background = form.clone();
    let task = tokio::spawn(async move {
        let handler = |_record: SignupRecord| async {
            tokio::time::sleep(Duration::from_millis(1000)).await;
            Ok::<(), SubmissionError>(())
        };
        background.submit(&handler).await
    });

    tokio::task::yield_now().await;
    form.wait_idle().await;
    assert!(!form.is_submitting());
    assert_eq!(task.await.unwrap(), SubmitOutcome::Submitted);
}

#[test]
fn snapshot_serializes_state() {
    let form = filled_form("test@email.com", "pw");
    let json = serde_json::to_value(form.snapshot()).unwrap();
    assert_eq!(json["state"], "idle");
    assert_eq!(json["values"]["email"], "test@email.com");
}

// ── Cross-field constraints ──────────────────────────────────────

#[derive(Debug, Deserialize)]
struct PasswordChange {
    password: String,
    confirm: String,
}

/// `confirm` must equal the form's current `password`, read through a
/// controller handle while the submission validates.
fn password_change_form() -> FormController<PasswordChange> {
    let cell: Arc<OnceLock<FormController<PasswordChange>>> = Arc::new(OnceLock::new());
    let lookup = Arc::clone(&cell);
    let schema = FormSchema::builder()
        .field(FieldSpec::string("password").min_length(8, PASSWORD_TOO_SHORT))
        .field(FieldSpec::string("confirm").custom(
            "matches",
            move |v| {
                lookup
                    .get()
                    .and_then(|form| form.value("password"))
                    .is_some_and(|password| password == v)
            },
            "passwords differ",
        ))
        .build()
        .unwrap();
    let form = FormController::new(Arc::new(schema), FormConfig::default()).unwrap();
    cell.set(form.clone()).unwrap();
    form
}

#[tokio::test]
async fn constraint_reading_the_form_does_not_block_submit() {
    let form = password_change_form();
    form.set_value("password", "longenough").unwrap();
    form.set_value("confirm", "longenough").unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&seen);
    let handler = move |record: PasswordChange| {
        recorder.lock().unwrap().push((record.password, record.confirm));
        async { Ok::<(), SubmissionError>(()) }
    };

    assert_eq!(form.submit(&handler).await, SubmitOutcome::Submitted);
    assert_eq!(
        seen.lock().unwrap().clone(),
        vec![("longenough".to_string(), "longenough".to_string())]
    );
}

#[tokio::test]
async fn constraint_reading_the_form_reports_mismatch() {
    let form = password_change_form();
    form.set_value("password", "longenough").unwrap();
    form.set_value("confirm", "different1").unwrap();
    let handler = |_record: PasswordChange| async { Ok::<(), SubmissionError>(()) };

    let outcome = form.submit(&handler).await;

    assert!(matches!(outcome, SubmitOutcome::Invalid { .. }));
    assert_eq!(form.error("confirm").as_deref(), Some("passwords differ"));
    assert_eq!(form.state(), SubmissionState::Idle);
}

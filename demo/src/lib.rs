//! Shared pieces of the formkit demo: a simulated signup endpoint and a
//! scripted session that drives a form the way a view would.

use async_trait::async_trait;
use formkit_form::{
    FormConfig, FormController, FormEvent, FormResult, FormView, InputKind, RenderedForm,
    SubmissionError, SubmissionHandler, SubmitOutcome,
};
use formkit_schema::{SignupRecord, EMAIL_FIELD};
use serde::Serialize;
use std::collections::HashSet;
use std::time::Duration;
use tracing::info;

/// Identifier pre-filled in the signup form.
pub const DEFAULT_EMAIL: &str = "test@email.com";
pub const TAKEN_MESSAGE: &str = "this email is already taken";

/// Stands in for a remote signup service: waits, then accepts, rejects an
/// already-registered email, or fails outright.
#[derive(Debug, Clone, Default)]
pub struct SimulatedEndpoint {
    delay: Duration,
    taken: HashSet<String>,
    unreachable: bool,
}

impl SimulatedEndpoint {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }

    /// Marks an email as already registered.
    pub fn with_taken(mut self, email: impl Into<String>) -> Self {
        self.taken.insert(email.into());
        self
    }

    /// Makes every call fail with a transport error.
    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }
}

#[async_trait]
impl SubmissionHandler<SignupRecord> for SimulatedEndpoint {
    async fn submit(&self, record: SignupRecord) -> Result<(), SubmissionError> {
        tokio::time::sleep(self.delay).await;
        if self.unreachable {
            return Err(anyhow::anyhow!("signup endpoint unreachable").into());
        }
        if self.taken.contains(&record.email) {
            return Err(SubmissionError::rejected(EMAIL_FIELD, TAKEN_MESSAGE));
        }
        info!(email = %record.email, "signup accepted");
        Ok(())
    }
}

/// Builds the signup form, pre-filling [`DEFAULT_EMAIL`] unless the
/// configuration seeds the field itself.
pub fn signup_form(mut config: FormConfig) -> FormResult<FormController<SignupRecord>> {
    config
        .default_values
        .entry(EMAIL_FIELD.to_string())
        .or_insert_with(|| DEFAULT_EMAIL.to_string());
    FormController::for_record(config)
}

/// One dispatched event and the form as rendered afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct Frame {
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<SubmitOutcome>,
    pub rendered: RenderedForm,
}

/// Dispatches `events` in order, rendering after each one.
pub async fn run_session<H>(
    form: &FormController<SignupRecord>,
    view: &FormView,
    events: Vec<FormEvent>,
    handler: &H,
) -> FormResult<Vec<Frame>>
where
    H: SubmissionHandler<SignupRecord> + ?Sized,
{
    let mut frames = Vec::with_capacity(events.len());
    for event in events {
        let label = describe(view, &event);
        let outcome = form.handle_event(event, handler).await?;
        frames.push(Frame {
            event: label,
            outcome,
            rendered: view.render(form),
        });
    }
    Ok(frames)
}

/// Formats frames for stdout: a single JSON array, or one text block per
/// frame with the outcome on its own line.
pub fn format_frames(frames: &[Frame], json: bool) -> serde_json::Result<String> {
    if json {
        return serde_json::to_string_pretty(frames);
    }
    let mut out = String::new();
    for frame in frames {
        out.push_str(&format!("> {}\n", frame.event));
        if let Some(outcome) = &frame.outcome {
            out.push_str(&format!("  {}\n", serde_json::to_string(outcome)?));
        }
        out.push_str(&format!("{}\n\n", frame.rendered));
    }
    Ok(out)
}

/// Human-readable event label; masked inputs never show their text.
pub fn describe(view: &FormView, event: &FormEvent) -> String {
    match event {
        FormEvent::Input { field, value } => {
            let masked = view
                .controls()
                .iter()
                .any(|c| &c.field == field && c.kind == InputKind::Password);
            if masked {
                format!("input {field} = {}", "*".repeat(value.chars().count()))
            } else {
                format!("input {field} = {value}")
            }
        }
        FormEvent::Submit => "submit".to_string(),
    }
}

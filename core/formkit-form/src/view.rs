//! Render model for a form.
//!
//! A [`FormView`] lists the controls; [`FormView::render`] combines it with a
//! controller's current state into a [`RenderedForm`] that any front end can
//! draw. The view talks back only through [`FormEvent`]s.

use crate::controller::FormController;
use formkit_schema::{EMAIL_FIELD, PASSWORD_FIELD, ROOT_ERROR_KEY};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const SUBMIT_LABEL: &str = "Submit";
pub const SUBMITTING_LABEL: &str = "Submitting...";

/// How a text input is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Text,
    /// Masked input; rendered values never contain the raw text.
    Password,
}

/// One input control bound to a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldControl {
    pub field: String,
    pub kind: InputKind,
    pub placeholder: String,
}

/// User intent emitted by a view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FormEvent {
    Input { field: String, value: String },
    Submit,
}

impl FormEvent {
    pub fn input(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Input {
            field: field.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormView {
    controls: Vec<FieldControl>,
}

impl FormView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn control(mut self, field: impl Into<String>, kind: InputKind, placeholder: impl Into<String>) -> Self {
        self.controls.push(FieldControl {
            field: field.into(),
            kind,
            placeholder: placeholder.into(),
        });
        self
    }

    /// Email text input followed by a masked password input.
    pub fn signup() -> Self {
        Self::new()
            .control(EMAIL_FIELD, InputKind::Text, "Email")
            .control(PASSWORD_FIELD, InputKind::Password, "Password")
    }

    pub fn controls(&self) -> &[FieldControl] {
        &self.controls
    }

    pub fn render<T>(&self, form: &FormController<T>) -> RenderedForm
    where
        T: DeserializeOwned + Send + 'static,
    {
        let snapshot = form.snapshot();
        let fields = self
            .controls
            .iter()
            .map(|control| {
                let raw = snapshot.value(&control.field).unwrap_or_default();
                let value = match control.kind {
                    InputKind::Text => raw.to_string(),
                    InputKind::Password => "*".repeat(raw.chars().count()),
                };
                RenderedField {
                    field: control.field.clone(),
                    kind: control.kind,
                    placeholder: control.placeholder.clone(),
                    value,
                    error: snapshot.error(&control.field).map(str::to_string),
                }
            })
            .collect();

        let submitting = snapshot.state.is_submitting();
        RenderedForm {
            fields,
            submit: SubmitControl {
                label: if submitting { SUBMITTING_LABEL } else { SUBMIT_LABEL }.to_string(),
                disabled: submitting,
            },
            root_error: snapshot.error(ROOT_ERROR_KEY).map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedField {
    pub field: String,
    pub kind: InputKind,
    pub placeholder: String,
    /// Masked for [`InputKind::Password`].
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitControl {
    pub label: String,
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedForm {
    pub fields: Vec<RenderedField>,
    pub submit: SubmitControl,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_error: Option<String>,
}

impl RenderedForm {
    pub fn field(&self, name: &str) -> Option<&RenderedField> {
        self.fields.iter().find(|f| f.field == name)
    }
}

impl fmt::Display for RenderedForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for field in &self.fields {
            if field.value.is_empty() {
                writeln!(f, "[{}] <{}>", field.field, field.placeholder)?;
            } else {
                writeln!(f, "[{}] {}", field.field, field.value)?;
            }
            if let Some(error) = &field.error {
                writeln!(f, "  ! {error}")?;
            }
        }
        let state = if self.submit.disabled { " (disabled)" } else { "" };
        write!(f, "<{}>{state}", self.submit.label)?;
        if let Some(error) = &self.root_error {
            write!(f, "\n! {error}")?;
        }
        Ok(())
    }
}

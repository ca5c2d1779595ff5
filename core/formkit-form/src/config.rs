//! Per-form configuration.

use crate::error::FormResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// What the user sees when a handler fails without a field attribution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnexpectedFailurePolicy {
    /// Log the failure and show nothing.
    #[default]
    Swallow,
    /// Show the failure message on the `"root"` error slot.
    Root,
}

/// Configuration for a form instance.
///
/// ```toml
/// unexpected_failure = "root"
///
/// [default_values]
/// email = "test@email.com"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    /// Values seeded into fields when the form is created.
    pub default_values: BTreeMap<String, String>,
    pub unexpected_failure: UnexpectedFailurePolicy,
}

impl FormConfig {
    /// Adds a seeded value.
    pub fn with_default(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_values.insert(field.into(), value.into());
        self
    }

    pub fn with_unexpected_failure(mut self, policy: UnexpectedFailurePolicy) -> Self {
        self.unexpected_failure = policy;
        self
    }

    pub fn from_toml_str(s: &str) -> FormResult<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> FormResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

use crate::constraint::{Constraint, Predicate};
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Primitive type tag of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    String,
}

impl FieldKind {
    /// Returns the value as a string if it has this kind.
    pub fn coerce<'a>(&self, value: &'a Value) -> Option<&'a str> {
        match self {
            Self::String => value.as_str(),
        }
    }
}

/// One named field: its kind, the message for a kind mismatch, and its
/// constraints in evaluation order.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: String,
    kind: FieldKind,
    type_message: String,
    constraints: Vec<Constraint>,
    /// Pattern that failed to compile; reported when the schema is built.
    pub(crate) invalid_pattern: Option<String>,
}

impl FieldSpec {
    /// Starts a string field.
    pub fn string(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::String,
            type_message: "expected string".to_string(),
            constraints: Vec::new(),
            invalid_pattern: None,
        }
    }

    /// Sets the message reported when the value is missing or has the wrong kind.
    pub fn type_message(mut self, message: impl Into<String>) -> Self {
        self.type_message = message.into();
        self
    }

    pub fn required(self, message: impl Into<String>) -> Self {
        self.constraint(Constraint::Required {
            message: message.into(),
        })
    }

    pub fn min_length(self, min: usize, message: impl Into<String>) -> Self {
        self.constraint(Constraint::MinLength {
            min,
            message: message.into(),
        })
    }

    pub fn email(self, message: impl Into<String>) -> Self {
        self.constraint(Constraint::Email {
            message: message.into(),
        })
    }

    /// Adds a regular-expression rule. A pattern that does not compile makes
    /// [`FormSchemaBuilder::build`](crate::FormSchemaBuilder::build) fail.
    pub fn pattern(mut self, pattern: &str, message: impl Into<String>) -> Self {
        match Regex::new(pattern) {
            Ok(regex) => self.constraint(Constraint::Pattern {
                regex,
                message: message.into(),
            }),
            Err(e) => {
                self.invalid_pattern.get_or_insert(e.to_string());
                self
            }
        }
    }

    pub fn custom<F>(self, name: impl Into<String>, predicate: F, message: impl Into<String>) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        let predicate: Predicate = Arc::new(predicate);
        self.constraint(Constraint::Custom {
            name: name.into(),
            predicate,
            message: message.into(),
        })
    }

    /// Appends an already-built constraint.
    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Validates one candidate value.
    ///
    /// Returns the coerced string, or every failing message in declaration
    /// order. A missing or mistyped value yields only the type message.
    pub fn check<'a>(&self, value: Option<&'a Value>) -> Result<&'a str, Vec<String>> {
        let Some(s) = value.and_then(|v| self.kind.coerce(v)) else {
            return Err(vec![self.type_message.clone()]);
        };
        let failures: Vec<String> = self
            .constraints
            .iter()
            .filter(|c| !c.check(s))
            .map(|c| c.message().to_string())
            .collect();
        if failures.is_empty() {
            Ok(s)
        } else {
            Err(failures)
        }
    }
}

use crate::error::{SchemaError, SchemaResult};
use crate::field::FieldSpec;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Reserved key for errors that belong to the whole form rather than a field.
pub const ROOT_ERROR_KEY: &str = "root";

/// An immutable, ordered set of fields with unique names.
#[derive(Debug, Clone)]
pub struct FormSchema {
    fields: Vec<FieldSpec>,
}

impl FormSchema {
    pub fn builder() -> FormSchemaBuilder {
        FormSchemaBuilder::default()
    }

    /// Wraps fields already known to be unique and well-formed.
    pub(crate) fn from_fields(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(FieldSpec::name)
    }

    /// Validates an untyped candidate record.
    ///
    /// Keys the schema does not declare are ignored and do not appear in the
    /// validated output. Values are passed through verbatim.
    pub fn validate(&self, candidate: &Map<String, Value>) -> Result<ValidatedValues, FieldErrors> {
        let mut values = BTreeMap::new();
        let mut errors = FieldErrors::new();

        for field in &self.fields {
            match field.check(candidate.get(field.name())) {
                Ok(s) => {
                    values.insert(field.name().to_string(), s.to_string());
                }
                Err(messages) => {
                    for message in messages {
                        errors.push(field.name(), message);
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(ValidatedValues(values))
        } else {
            debug!(fields = ?errors.fields().collect::<Vec<_>>(), "validation failed");
            Err(errors)
        }
    }

    /// Validates a map of raw strings, as held by a form.
    pub fn validate_strings(
        &self,
        values: &BTreeMap<String, String>,
    ) -> Result<ValidatedValues, FieldErrors> {
        let candidate: Map<String, Value> = values
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        self.validate(&candidate)
    }

    /// Validates and builds the typed record.
    ///
    /// A record type that does not match the schema is reported on
    /// [`ROOT_ERROR_KEY`].
    pub fn validate_as<T: DeserializeOwned>(&self, candidate: &Map<String, Value>) -> Result<T, FieldErrors> {
        self.validate(candidate)?.into_record()
    }
}

/// Collects fields and checks them into a [`FormSchema`].
#[derive(Debug, Default)]
pub struct FormSchemaBuilder {
    fields: Vec<FieldSpec>,
}

impl FormSchemaBuilder {
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn build(self) -> SchemaResult<FormSchema> {
        if self.fields.is_empty() {
            return Err(SchemaError::EmptySchema);
        }
        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name() == ROOT_ERROR_KEY {
                return Err(SchemaError::ReservedField(field.name().to_string()));
            }
            if !seen.insert(field.name()) {
                return Err(SchemaError::DuplicateField(field.name().to_string()));
            }
            if let Some(reason) = &field.invalid_pattern {
                return Err(SchemaError::InvalidPattern {
                    field: field.name().to_string(),
                    reason: reason.clone(),
                });
            }
        }
        Ok(FormSchema::from_fields(self.fields))
    }
}

/// Field values that passed validation, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidatedValues(BTreeMap<String, String>);

impl ValidatedValues {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.0
    }

    /// Builds a typed record from the validated values.
    pub fn into_record<T: DeserializeOwned>(self) -> Result<T, FieldErrors> {
        let object: Map<String, Value> = self
            .0
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();
        serde_json::from_value(Value::Object(object)).map_err(|e| {
            let mut errors = FieldErrors::new();
            errors.push(ROOT_ERROR_KEY, format!("record mismatch: {e}"));
            errors
        })
    }
}

/// Per-field validation messages, in declaration order within each field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message for a field.
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    /// The message a form shows for `field`: the first failure.
    pub fn first(&self, field: &str) -> Option<&str> {
        self.0
            .get(field)
            .and_then(|m| m.first())
            .map(String::as_str)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Collapses to one message per field.
    pub fn first_messages(&self) -> BTreeMap<String, String> {
        self.0
            .iter()
            .filter_map(|(k, v)| v.first().map(|m| (k.clone(), m.clone())))
            .collect()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            if !first {
                write!(f, "; ")?;
            }
            first = false;
            write!(f, "{field}: {}", messages.join(", "))?;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

/// A typed record produced by a schema.
///
/// Implementors name the schema whose validated output deserializes into
/// `Self`, so the record type and the rules stay declared side by side.
pub trait FormRecord: DeserializeOwned + Send + 'static {
    fn schema() -> Arc<FormSchema>;
}

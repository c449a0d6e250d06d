//! Per-field validation message aggregation.
//!
//! Commands collect every field problem before failing so clients see all of
//! them at once. The resulting error carries
//! `details.fields = { "<field>": ["<message>", ...] }`.

use std::collections::BTreeMap;

use serde_json::json;

use crate::domain::Error;

/// Accumulates validation messages keyed by wire field name.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FieldErrors {
    fields: BTreeMap<&'static str, Vec<String>>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message against `field`.
    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_default().push(message.into());
    }

    /// Record the error from `result` against `field`, returning the success value.
    pub fn check<T, E: std::fmt::Display>(
        &mut self,
        field: &'static str,
        result: Result<T, E>,
    ) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.push(field, err.to_string());
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Messages recorded for `field`.
    pub fn messages(&self, field: &str) -> &[String] {
        self.fields.get(field).map_or(&[], Vec::as_slice)
    }

    /// Fail with [`crate::domain::ErrorCode::ValidationFailed`] when any field
    /// message was recorded.
    pub fn finish(self) -> Result<(), Error> {
        if self.is_empty() {
            return Ok(());
        }
        Err(self.into_error())
    }

    /// Shorthand for a failure on a single field.
    pub fn single(field: &'static str, message: impl Into<String>) -> Error {
        let mut errors = Self::new();
        errors.push(field, message);
        errors.into_error()
    }

    /// Render the collected messages as a validation error.
    pub fn into_error(self) -> Error {
        Error::validation_failed("The given data was invalid.")
            .with_details(json!({ "fields": self.fields }))
    }

    /// Render the collected messages as a malformed-request error, used for
    /// query strings where `422` would be misleading.
    pub fn into_invalid_request(self, message: impl Into<String>) -> Error {
        Error::invalid_request(message).with_details(json!({ "fields": self.fields }))
    }
}

//! Shared validation helpers for inbound HTTP adapters.

use serde::{Deserialize, Deserializer};
use serde_json::json;

use crate::domain::{Error, FieldErrors, IdValidationError};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    InvalidId,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidId => "invalid_id",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub(crate) const fn as_str(self) -> &'static str {
        self.0
    }
}

pub(crate) fn invalid_id_error(field: FieldName, value: i64) -> Error {
    let field = field.as_str();
    Error::invalid_request(format!("{field} must be a positive integer")).with_details(json!({
        "field": field,
        "value": value,
        "code": ErrorCode::InvalidId.as_str(),
    }))
}

/// Wrap a raw path id, rejecting zero and negative values with `400`.
pub(crate) fn parse_path_id<I>(raw: i64, field: FieldName) -> Result<I, Error>
where
    I: TryFrom<i64, Error = IdValidationError>,
{
    I::try_from(raw).map_err(|_| invalid_id_error(field, raw))
}

/// Wrap an optional body id, recording a failure against `field`.
pub(crate) fn check_optional_id<I>(
    errors: &mut FieldErrors,
    field: FieldName,
    raw: Option<i64>,
) -> Option<I>
where
    I: TryFrom<i64, Error = IdValidationError>,
{
    errors
        .check(field.as_str(), raw.map(I::try_from).transpose())
        .flatten()
}

/// Wrap a list of body ids, recording each failure against `field`.
pub(crate) fn check_id_list<I>(errors: &mut FieldErrors, field: FieldName, raw: Vec<i64>) -> Vec<I>
where
    I: TryFrom<i64, Error = IdValidationError>,
{
    raw.into_iter()
        .filter_map(|value| errors.check(field.as_str(), I::try_from(value)))
        .collect()
}

/// Deserialise a field as `Some(None)` for `null` and `Some(Some(v))` for a
/// value. Combine with `#[serde(default)]` so an absent field stays `None`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

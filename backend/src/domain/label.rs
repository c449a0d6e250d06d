//! Ticket labels: a unique name and a display colour.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::LabelId;

/// Longest accepted label name, in characters.
pub const LABEL_NAME_MAX: usize = 64;

/// Rejected label input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LabelValidationError {
    #[error("name is required")]
    EmptyName,
    #[error("name may not be greater than {max} characters")]
    NameTooLong { max: usize },
    #[error("color must be a hex colour like #1A2B3C, got \"{value}\"")]
    InvalidColor { value: String },
}

/// Trimmed, non-empty label name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LabelName(String);

impl LabelName {
    pub fn new(name: impl Into<String>) -> Result<Self, LabelValidationError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(LabelValidationError::EmptyName);
        }
        if trimmed.chars().count() > LABEL_NAME_MAX {
            return Err(LabelValidationError::NameTooLong {
                max: LABEL_NAME_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for LabelName {
    type Error = LabelValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LabelName> for String {
    fn from(value: LabelName) -> Self {
        value.0
    }
}

impl fmt::Display for LabelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

static COLOR_RE: OnceLock<Regex> = OnceLock::new();

fn color_regex() -> &'static Regex {
    COLOR_RE.get_or_init(|| {
        Regex::new("^#[0-9A-Fa-f]{6}$")
            .unwrap_or_else(|error| panic!("label colour regex failed to compile: {error}"))
    })
}

/// `#RRGGBB` colour, normalised to uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LabelColor(String);

impl LabelColor {
    pub fn new(color: impl Into<String>) -> Result<Self, LabelValidationError> {
        let color = color.into();
        let trimmed = color.trim();
        if !color_regex().is_match(trimmed) {
            return Err(LabelValidationError::InvalidColor { value: color });
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for LabelColor {
    type Error = LabelValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LabelColor> for String {
    fn from(value: LabelColor) -> Self {
        value.0
    }
}

/// A stored label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub id: LabelId,
    pub name: LabelName,
    pub color: LabelColor,
}

/// A label ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLabel {
    pub name: LabelName,
    pub color: LabelColor,
}

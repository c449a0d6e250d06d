//! Integer identifiers for helpdesk entities.
//!
//! Every id is a positive 64-bit integer assigned by storage. Wrapping each
//! one in its own newtype keeps a `BranchId` from being passed where a
//! `UserId` is expected.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Validation error raised when an id is zero or negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{kind} must be a positive integer, got {value}")]
pub struct IdValidationError {
    kind: &'static str,
    value: i64,
}

impl IdValidationError {
    /// Name of the rejected id type.
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// The rejected raw value.
    pub fn value(&self) -> i64 {
        self.value
    }
}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident => $label:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
            ToSchema,
        )]
        #[serde(try_from = "i64", into = "i64")]
        #[schema(value_type = i64, example = 1)]
        pub struct $name(i64);

        impl $name {
            /// Validate and wrap a raw id.
            pub const fn new(value: i64) -> Result<Self, IdValidationError> {
                if value <= 0 {
                    return Err(IdValidationError { kind: $label, value });
                }
                Ok(Self(value))
            }

            /// Raw integer value.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl TryFrom<i64> for $name {
            type Error = IdValidationError;

            fn try_from(value: i64) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for i64 {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Ticket primary key.
    TicketId => "ticket id"
);
define_id!(
    /// User primary key; agents, managers and admins are all users.
    UserId => "user id"
);
define_id!(
    /// Customer primary key.
    CustomerId => "customer id"
);
define_id!(
    /// Branch primary key.
    BranchId => "branch id"
);
define_id!(
    /// Label primary key.
    LabelId => "label id"
);
define_id!(
    /// Priority reference row key.
    PriorityId => "priority id"
);
define_id!(
    /// Task key used to group task-scoped activities.
    TaskId => "task id"
);
define_id!(
    /// Activity primary key.
    ActivityId => "activity id"
);

//! Append-only audit records attached to tickets.
//!
//! Activities are never updated or deleted and survive soft deletion of
//! their ticket. Lifecycle and assignment mutations build [`ActivityEntry`]
//! values and hand them to the repository together with the mutation so both
//! land in one transaction; the repository fills in the ticket id.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::domain::{ActivityId, TaskId, TicketId, UserId};

/// Activity kinds written by ticket operations.
pub mod kinds {
    pub const TICKET_CREATED: &str = "Ticket Created";
    pub const STATUS_CHANGED: &str = "Ticket Status Changed";
    pub const PRIORITY_CHANGED: &str = "Ticket Priority Changed";
    pub const BRANCH_CHANGED: &str = "Ticket Branch Changed";
    pub const DUE_DATE_CHANGED: &str = "Ticket Due Date Changed";
    pub const CLOSED_TIME_CHANGED: &str = "Ticket Closed Time Changed";
    pub const CUSTOMER_CHANGED: &str = "Ticket Customer Changed";
    pub const DETAILS_UPDATED: &str = "Ticket Details Updated";
    pub const AGENT_ASSIGNED: &str = "Agent Assigned";
    pub const AGENT_REMOVED: &str = "Agent Removed";
    pub const NOTIFY_USER_ADDED: &str = "Notify User Added";
    pub const NOTIFY_USER_REMOVED: &str = "Notify User Removed";
    pub const LABEL_ADDED: &str = "Label Added";
    pub const LABEL_REMOVED: &str = "Label Removed";
    pub const TICKET_DELETED: &str = "Ticket Deleted";
    pub const TICKET_RESTORED: &str = "Ticket Restored";
}

/// Longest accepted free-text kind tag.
pub const ACTIVITY_KIND_MAX: usize = 100;

/// Rejected activity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ActivityKindError {
    #[error("activity type must not be empty")]
    Empty,
    #[error("activity type may not be greater than {max} characters")]
    TooLong { max: usize },
}

/// Free-text type tag such as `"Ticket Status Changed"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ActivityKind(String);

impl ActivityKind {
    pub fn new(kind: impl Into<String>) -> Result<Self, ActivityKindError> {
        let kind = kind.into();
        let trimmed = kind.trim();
        if trimmed.is_empty() {
            return Err(ActivityKindError::Empty);
        }
        if trimmed.chars().count() > ACTIVITY_KIND_MAX {
            return Err(ActivityKindError::TooLong {
                max: ACTIVITY_KIND_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Wrap one of the [`kinds`] constants.
    pub(crate) fn known(kind: &'static str) -> Self {
        Self(kind.to_owned())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for ActivityKind {
    type Error = ActivityKindError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ActivityKind> for String {
    fn from(value: ActivityKind) -> Self {
        value.0
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An activity waiting to be appended to a ticket's log.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityEntry {
    pub task_id: Option<TaskId>,
    pub kind: ActivityKind,
    pub note: String,
    pub extra: Option<Value>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

impl ActivityEntry {
    /// Entry for one of the built-in kinds.
    pub(crate) fn known(
        kind: &'static str,
        note: impl Into<String>,
        created_by: UserId,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            task_id: None,
            kind: ActivityKind::known(kind),
            note: note.into(),
            extra: None,
            created_by,
            created_at,
        }
    }

    /// Field transition entry: note `"<Field> changed from <old> to <new>"`
    /// with the raw labels mirrored into `extra`.
    pub(crate) fn field_change(
        kind: &'static str,
        field: &str,
        from: &str,
        to: &str,
        created_by: UserId,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self::known(
            kind,
            format!("{field} changed from {from} to {to}"),
            created_by,
            created_at,
        )
        .with_extra(json!({ "field": field, "from": from, "to": to }))
    }

    pub fn with_extra(mut self, extra: Value) -> Self {
        self.extra = Some(extra);
        self
    }

    /// Attach the ticket and storage ids.
    pub fn into_activity(self, id: ActivityId, ticket_id: TicketId) -> Activity {
        Activity {
            id,
            ticket_id,
            task_id: self.task_id,
            kind: self.kind,
            note: self.note,
            extra: self.extra,
            created_by: self.created_by,
            created_at: self.created_at,
        }
    }
}

/// A stored activity.
#[derive(Debug, Clone, PartialEq)]
pub struct Activity {
    pub id: ActivityId,
    pub ticket_id: TicketId,
    pub task_id: Option<TaskId>,
    pub kind: ActivityKind,
    pub note: String,
    pub extra: Option<Value>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

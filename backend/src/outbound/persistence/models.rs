//! Internal Diesel row structs and their conversions to domain types.
//!
//! Rows never leave the persistence layer. Reading a row validates every
//! column against the domain newtypes, so a hand-edited database surfaces as
//! an [`InvalidRow`] instead of a panic.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

use crate::domain::{
    Activity, ActivityEntry, ActivityId, ActivityKind, BranchId, CustomerId, DirectoryUser, Label,
    LabelColor, LabelId, LabelName, NewLabel, NewTicket, PriorityId, Role, TaskId, Ticket,
    TicketId, TicketStatus, TrackingNumber, UserId,
};

use super::schema::{activities, labels, tickets, users};

/// A stored value the domain rejects.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("stored {column} is invalid: {message}")]
pub(crate) struct InvalidRow {
    column: &'static str,
    message: String,
}

fn column<T, E: std::fmt::Display>(
    name: &'static str,
    result: Result<T, E>,
) -> Result<T, InvalidRow> {
    result.map_err(|error| InvalidRow {
        column: name,
        message: error.to_string(),
    })
}

fn optional<T, E: std::fmt::Display>(
    name: &'static str,
    value: Option<i64>,
    parse: impl FnOnce(i64) -> Result<T, E>,
) -> Result<Option<T>, InvalidRow> {
    value.map(|raw| column(name, parse(raw))).transpose()
}

// ---------------------------------------------------------------------------
// Tickets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tickets)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TicketRow {
    pub id: i64,
    pub tracking_number: String,
    pub slug: String,
    pub issue: String,
    pub description: Option<String>,
    pub priority_id: Option<i64>,
    pub status: i16,
    pub ticket_type: String,
    pub due_date: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub customer_id: Option<i64>,
    pub created_by: i64,
    pub branch_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<TicketRow> for Ticket {
    type Error = InvalidRow;

    fn try_from(row: TicketRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: column("tickets.id", TicketId::new(row.id))?,
            tracking_number: column(
                "tickets.tracking_number",
                TrackingNumber::parse(row.tracking_number),
            )?,
            slug: row.slug,
            issue: row.issue,
            description: row.description,
            priority_id: optional("tickets.priority_id", row.priority_id, PriorityId::new)?,
            status: column("tickets.status", TicketStatus::from_code(row.status))?,
            ticket_type: column("tickets.ticket_type", row.ticket_type.parse())?,
            due_date: row.due_date,
            closed_at: row.closed_at,
            customer_id: optional("tickets.customer_id", row.customer_id, CustomerId::new)?,
            created_by: column("tickets.created_by", UserId::new(row.created_by))?,
            branch_id: optional("tickets.branch_id", row.branch_id, BranchId::new)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tickets)]
pub(crate) struct NewTicketRow<'a> {
    pub tracking_number: &'a str,
    pub slug: &'a str,
    pub issue: &'a str,
    pub description: Option<&'a str>,
    pub priority_id: Option<i64>,
    pub status: i16,
    pub ticket_type: &'a str,
    pub due_date: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub customer_id: Option<i64>,
    pub created_by: i64,
    pub branch_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> From<&'a NewTicket> for NewTicketRow<'a> {
    fn from(ticket: &'a NewTicket) -> Self {
        Self {
            tracking_number: ticket.tracking_number.as_str(),
            slug: &ticket.slug,
            issue: &ticket.issue,
            description: ticket.description.as_deref(),
            priority_id: ticket.priority_id.map(PriorityId::get),
            status: ticket.status.code(),
            ticket_type: ticket.ticket_type.as_str(),
            due_date: ticket.due_date,
            closed_at: ticket.closed_at,
            customer_id: ticket.customer_id.map(CustomerId::get),
            created_by: ticket.created_by.get(),
            branch_id: ticket.branch_id.map(BranchId::get),
            created_at: ticket.created_at,
            updated_at: ticket.created_at,
        }
    }
}

/// Every mutable ticket column. `None` writes NULL so cleared fields stick.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = tickets)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct TicketChangeset<'a> {
    pub slug: &'a str,
    pub issue: &'a str,
    pub description: Option<&'a str>,
    pub priority_id: Option<i64>,
    pub status: i16,
    pub due_date: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub customer_id: Option<i64>,
    pub branch_id: Option<i64>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl<'a> From<&'a Ticket> for TicketChangeset<'a> {
    fn from(ticket: &'a Ticket) -> Self {
        Self {
            slug: &ticket.slug,
            issue: &ticket.issue,
            description: ticket.description.as_deref(),
            priority_id: ticket.priority_id.map(PriorityId::get),
            status: ticket.status.code(),
            due_date: ticket.due_date,
            closed_at: ticket.closed_at,
            customer_id: ticket.customer_id.map(CustomerId::get),
            branch_id: ticket.branch_id.map(BranchId::get),
            updated_at: ticket.updated_at,
            deleted_at: ticket.deleted_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Activities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = activities)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ActivityRow {
    pub id: i64,
    pub ticket_id: i64,
    pub task_id: Option<i64>,
    pub kind: String,
    pub note: String,
    pub extra: Option<Value>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<ActivityRow> for Activity {
    type Error = InvalidRow;

    fn try_from(row: ActivityRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: column("activities.id", ActivityId::new(row.id))?,
            ticket_id: column("activities.ticket_id", TicketId::new(row.ticket_id))?,
            task_id: optional("activities.task_id", row.task_id, TaskId::new)?,
            kind: column("activities.kind", ActivityKind::new(row.kind))?,
            note: row.note,
            extra: row.extra,
            created_by: column("activities.created_by", UserId::new(row.created_by))?,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = activities)]
pub(crate) struct NewActivityRow<'a> {
    pub ticket_id: i64,
    pub task_id: Option<i64>,
    pub kind: &'a str,
    pub note: &'a str,
    pub extra: Option<&'a Value>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
}

impl<'a> NewActivityRow<'a> {
    pub fn new(ticket_id: i64, entry: &'a ActivityEntry) -> Self {
        Self {
            ticket_id,
            task_id: entry.task_id.map(TaskId::get),
            kind: entry.kind.as_str(),
            note: &entry.note,
            extra: entry.extra.as_ref(),
            created_by: entry.created_by.get(),
            created_at: entry.created_at,
        }
    }

    /// Rows for a batch of entries on one ticket.
    pub fn batch(ticket_id: i64, entries: &'a [ActivityEntry]) -> Vec<Self> {
        entries
            .iter()
            .map(|entry| Self::new(ticket_id, entry))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = labels)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct LabelRow {
    pub id: i64,
    pub name: String,
    pub color: String,
}

impl TryFrom<LabelRow> for Label {
    type Error = InvalidRow;

    fn try_from(row: LabelRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: column("labels.id", LabelId::new(row.id))?,
            name: column("labels.name", LabelName::new(row.name))?,
            color: column("labels.color", LabelColor::new(row.color))?,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = labels)]
pub(crate) struct NewLabelRow<'a> {
    pub name: &'a str,
    pub color: &'a str,
}

impl<'a> From<&'a NewLabel> for NewLabelRow<'a> {
    fn from(label: &'a NewLabel) -> Self {
        Self {
            name: label.name.as_str(),
            color: label.color.as_str(),
        }
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: i16,
    pub branch_id: Option<i64>,
}

impl TryFrom<UserRow> for DirectoryUser {
    type Error = InvalidRow;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: column("users.id", UserId::new(row.id))?,
            name: row.name,
            email: row.email,
            role: column("users.role", Role::from_code(row.role))?,
            branch_id: optional("users.branch_id", row.branch_id, BranchId::new)?,
        })
    }
}

//! Ticket aggregate and its value types.
//!
//! A ticket is identified by a storage id and a human-facing tracking number
//! (`TKT0000042` for in-shop work, `ONS0000042` for on-site visits). Both are
//! immutable once assigned. Deletion is soft: `deleted_at` is stamped and the
//! row stays visible in the trashed bucket.

mod patch;

pub use patch::{FieldUpdate, TicketChange, TicketPatch};

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Actor, BranchId, CustomerId, Label, PriorityId, TicketId, UserId};

/// Longest accepted issue summary, in characters.
pub const ISSUE_MAX: usize = 255;

/// Largest sequence value that still fits the seven tracking digits.
pub const TRACKING_SEQUENCE_MAX: u64 = 9_999_999;

/// Lifecycle status stored as a small integer code.
///
/// Any status may follow any other; the lifecycle is deliberately unguarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum TicketStatus {
    Open,
    InProgress,
    Closed,
    Completed,
}

/// Rejected status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown ticket status {0}")]
pub struct UnknownStatusError(pub i16);

impl TicketStatus {
    pub const ALL: [Self; 4] = [Self::Open, Self::InProgress, Self::Closed, Self::Completed];

    pub const fn code(self) -> i16 {
        match self {
            Self::Open => 1,
            Self::InProgress => 2,
            Self::Closed => 3,
            Self::Completed => 4,
        }
    }

    pub const fn from_code(code: i16) -> Result<Self, UnknownStatusError> {
        match code {
            1 => Ok(Self::Open),
            2 => Ok(Self::InProgress),
            3 => Ok(Self::Closed),
            4 => Ok(Self::Completed),
            other => Err(UnknownStatusError(other)),
        }
    }

    /// Display label used when the statuses reference table has no row.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::InProgress => "In Progress",
            Self::Closed => "Closed",
            Self::Completed => "Completed",
        }
    }
}

impl TryFrom<i16> for TicketStatus {
    type Error = UnknownStatusError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        Self::from_code(value)
    }
}

impl From<TicketStatus> for i16 {
    fn from(value: TicketStatus) -> Self {
        value.code()
    }
}

/// Where the work happens; selects the tracking number prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
pub enum TicketType {
    #[default]
    #[serde(rename = "In Shop")]
    InShop,
    #[serde(rename = "On Site")]
    OnSite,
}

/// Rejected ticket type string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("ticket type must be \"In Shop\" or \"On Site\", got \"{0}\"")]
pub struct UnknownTicketTypeError(pub String);

impl TicketType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InShop => "In Shop",
            Self::OnSite => "On Site",
        }
    }

    /// Tracking number prefix for this type.
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::InShop => "TKT",
            Self::OnSite => "ONS",
        }
    }
}

impl FromStr for TicketType {
    type Err = UnknownTicketTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "In Shop" => Ok(Self::InShop),
            "On Site" => Ok(Self::OnSite),
            other => Err(UnknownTicketTypeError(other.to_owned())),
        }
    }
}

impl fmt::Display for TicketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracking number errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrackingNumberError {
    #[error("tracking sequence exhausted at {value}")]
    Exhausted { value: u64 },
    #[error("malformed tracking number \"{value}\"")]
    Malformed { value: String },
}

/// Human-facing ticket number: a type prefix and seven zero-padded digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TrackingNumber(String);

static TRACKING_RE: OnceLock<Regex> = OnceLock::new();

fn tracking_regex() -> &'static Regex {
    TRACKING_RE.get_or_init(|| {
        Regex::new(r"^(TKT|ONS)\d{7}$")
            .unwrap_or_else(|error| panic!("tracking number regex failed to compile: {error}"))
    })
}

impl TrackingNumber {
    /// Format a freshly allocated sequence value.
    pub fn allocate(ticket_type: TicketType, value: u64) -> Result<Self, TrackingNumberError> {
        if value > TRACKING_SEQUENCE_MAX {
            return Err(TrackingNumberError::Exhausted { value });
        }
        Ok(Self(format!("{}{value:07}", ticket_type.prefix())))
    }

    /// Validate a stored tracking number.
    pub fn parse(value: impl Into<String>) -> Result<Self, TrackingNumberError> {
        let value = value.into();
        if !tracking_regex().is_match(&value) {
            return Err(TrackingNumberError::Malformed { value });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for TrackingNumber {
    type Error = TrackingNumberError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<TrackingNumber> for String {
    fn from(value: TrackingNumber) -> Self {
        value.0
    }
}

impl fmt::Display for TrackingNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rejected issue summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IssueValidationError {
    #[error("issue is required")]
    Empty,
    #[error("issue may not be greater than {max} characters")]
    TooLong { max: usize },
}

/// Trim and validate an issue summary.
pub fn normalize_issue(raw: &str) -> Result<String, IssueValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(IssueValidationError::Empty);
    }
    if trimmed.chars().count() > ISSUE_MAX {
        return Err(IssueValidationError::TooLong { max: ISSUE_MAX });
    }
    Ok(trimmed.to_owned())
}

/// A persisted ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub id: TicketId,
    pub tracking_number: TrackingNumber,
    pub slug: String,
    pub issue: String,
    pub description: Option<String>,
    pub priority_id: Option<PriorityId>,
    pub status: TicketStatus,
    pub ticket_type: TicketType,
    pub due_date: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub customer_id: Option<CustomerId>,
    pub created_by: UserId,
    pub branch_id: Option<BranchId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Ticket {
    pub fn is_trashed(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Creator, admins and managers may trash or restore a ticket.
    pub fn can_be_trashed_by(&self, actor: &Actor) -> bool {
        self.created_by == actor.id() || actor.role().can_trash_any_ticket()
    }

    pub fn trash(&mut self, now: DateTime<Utc>) {
        self.deleted_at = Some(now);
        self.updated_at = now;
    }

    /// Bring a trashed ticket back; it always reopens.
    pub fn restore(&mut self, now: DateTime<Utc>) {
        self.deleted_at = None;
        self.status = TicketStatus::Open;
        self.updated_at = now;
    }
}

/// A ticket ready to insert; storage assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTicket {
    pub tracking_number: TrackingNumber,
    pub slug: String,
    pub issue: String,
    pub description: Option<String>,
    pub priority_id: Option<PriorityId>,
    pub status: TicketStatus,
    pub ticket_type: TicketType,
    pub due_date: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub customer_id: Option<CustomerId>,
    pub created_by: UserId,
    pub branch_id: Option<BranchId>,
    pub created_at: DateTime<Utc>,
}

impl NewTicket {
    /// Attach the storage id.
    pub fn into_ticket(self, id: TicketId) -> Ticket {
        Ticket {
            id,
            tracking_number: self.tracking_number,
            slug: self.slug,
            issue: self.issue,
            description: self.description,
            priority_id: self.priority_id,
            status: self.status,
            ticket_type: self.ticket_type,
            due_date: self.due_date,
            closed_at: self.closed_at,
            customer_id: self.customer_id,
            created_by: self.created_by,
            branch_id: self.branch_id,
            created_at: self.created_at,
            updated_at: self.created_at,
            deleted_at: None,
        }
    }
}

/// A ticket together with its assignment sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketDetails {
    pub ticket: Ticket,
    pub agent_ids: Vec<UserId>,
    pub notify_user_ids: Vec<UserId>,
    pub labels: Vec<Label>,
}

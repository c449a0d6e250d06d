//! Domain primitives, aggregates and services.
//!
//! Purpose: define the strongly typed helpdesk model (tickets, assignments,
//! activities, labels, role scopes) and the services that drive it through
//! the traits in [`ports`]. Nothing here knows about HTTP or SQL.
//!
//! Public surface:
//! - [`Error`] / [`ErrorCode`]: API error payload and stable identifiers.
//! - [`Ticket`], [`TicketPatch`], [`TrackingNumber`]: the lifecycle aggregate.
//! - [`TicketScope`]: role-based visibility shared by every ticket read.
//! - `*Service` types: implementations of the driving ports.

pub mod activity;
pub mod actor;
pub mod auth;
pub mod directory;
pub mod error;
pub mod ids;
pub mod label;
pub mod listing;
pub mod ports;
pub mod scope;
pub mod slug;
pub mod ticket;
pub mod trace_id;
pub mod validation;

mod activity_log_service;
mod assignment_service;
mod directory_service;
mod label_service;
mod ticket_command_service;
mod ticket_query_service;
mod ticket_service_support;

#[cfg(test)]
pub(crate) mod service_test_helpers;

pub use self::activity::{
    ACTIVITY_KIND_MAX, Activity, ActivityEntry, ActivityKind, ActivityKindError, kinds,
};
pub use self::activity_log_service::ActivityLogService;
pub use self::actor::{Actor, Role, UnknownRoleError};
pub use self::assignment_service::AssignmentService;
pub use self::auth::{LoginCredentials, LoginValidationError};
pub use self::directory::{DirectoryUser, NONE_LABEL};
pub use self::directory_service::DirectoryService;
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::ids::{
    ActivityId, BranchId, CustomerId, IdValidationError, LabelId, PriorityId, TaskId, TicketId,
    UserId,
};
pub use self::label::{LABEL_NAME_MAX, Label, LabelColor, LabelName, LabelValidationError, NewLabel};
pub use self::label_service::LabelService;
pub use self::listing::{TicketBucket, TicketFilter, TicketListQuery};
pub use self::scope::{ScopeFacts, TicketScope};
pub use self::slug::{SLUG_PREFIX_MAX, ticket_slug};
pub use self::ticket::{
    FieldUpdate, ISSUE_MAX, IssueValidationError, NewTicket, TRACKING_SEQUENCE_MAX, Ticket,
    TicketChange, TicketDetails, TicketPatch, TicketStatus, TicketType, TrackingNumber,
    TrackingNumberError, UnknownStatusError, UnknownTicketTypeError, normalize_issue,
};
pub use self::ticket_command_service::TicketCommandService;
pub use self::ticket_query_service::TicketQueryService;
pub use self::trace_id::TraceId;
pub use self::validation::FieldErrors;

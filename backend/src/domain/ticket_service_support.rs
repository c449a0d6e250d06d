//! Helpers shared by the ticket, assignment and activity services.

use chrono::{DateTime, Utc};

use crate::domain::ports::{
    ActivityRepositoryError, AssignmentRepositoryError, DirectoryRepository,
    DirectoryRepositoryError, LabelRepositoryError, TicketRepository, TicketRepositoryError,
    TrackingSequenceError,
};
use crate::domain::{Actor, Error, NONE_LABEL, Role, Ticket, TicketId, TicketScope};

/// Timestamp format used in activity notes.
pub(crate) const NOTE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

pub(crate) fn map_ticket_error(error: TicketRepositoryError) -> Error {
    match error {
        TicketRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("ticket repository unavailable: {message}"))
        }
        TicketRepositoryError::Query { message } => {
            Error::internal(format!("ticket repository error: {message}"))
        }
        TicketRepositoryError::DuplicateTrackingNumber { tracking_number } => Error::internal(
            format!("tracking number {tracking_number} was allocated twice"),
        ),
    }
}

pub(crate) fn map_sequence_error(error: TrackingSequenceError) -> Error {
    match error {
        TrackingSequenceError::Connection { message } => {
            Error::service_unavailable(format!("tracking sequence unavailable: {message}"))
        }
        TrackingSequenceError::Query { message } => {
            Error::internal(format!("tracking sequence error: {message}"))
        }
    }
}

pub(crate) fn map_directory_error(error: DirectoryRepositoryError) -> Error {
    match error {
        DirectoryRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("directory unavailable: {message}"))
        }
        DirectoryRepositoryError::Query { message } => {
            Error::internal(format!("directory error: {message}"))
        }
    }
}

pub(crate) fn map_assignment_error(error: AssignmentRepositoryError) -> Error {
    match error {
        AssignmentRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("assignment repository unavailable: {message}"))
        }
        AssignmentRepositoryError::Query { message } => {
            Error::internal(format!("assignment repository error: {message}"))
        }
    }
}

pub(crate) fn map_activity_error(error: ActivityRepositoryError) -> Error {
    match error {
        ActivityRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("activity repository unavailable: {message}"))
        }
        ActivityRepositoryError::Query { message } => {
            Error::internal(format!("activity repository error: {message}"))
        }
    }
}

pub(crate) fn map_label_error(error: LabelRepositoryError) -> Error {
    match error {
        LabelRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("label repository unavailable: {message}"))
        }
        LabelRepositoryError::Query { message } => {
            Error::internal(format!("label repository error: {message}"))
        }
        LabelRepositoryError::DuplicateName { name } => {
            Error::conflict(format!("label {name} already exists"))
        }
    }
}

pub(crate) fn ticket_not_found(id: TicketId) -> Error {
    Error::not_found(format!("ticket {id} not found"))
}

/// Build the visibility scope for `actor`, loading managed agents only for
/// managers.
pub(crate) async fn resolve_scope<D>(directory: &D, actor: &Actor) -> Result<TicketScope, Error>
where
    D: DirectoryRepository + ?Sized,
{
    let managed = match actor.role() {
        Role::Manager => directory
            .managed_agent_ids(actor.id())
            .await
            .map_err(map_directory_error)?,
        Role::Admin | Role::Agent | Role::BranchAdmin => Vec::new(),
    };
    Ok(TicketScope::for_actor(actor, managed))
}

/// Load a ticket visible under `scope`, trashed or not.
pub(crate) async fn find_visible_ticket<T>(
    tickets: &T,
    id: TicketId,
    scope: &TicketScope,
) -> Result<Ticket, Error>
where
    T: TicketRepository + ?Sized,
{
    if scope.is_nothing() {
        return Err(ticket_not_found(id));
    }
    tickets
        .find_scoped(id, scope)
        .await
        .map_err(map_ticket_error)?
        .ok_or_else(|| ticket_not_found(id))
}

/// Load a visible ticket that is not in the trash.
pub(crate) async fn find_live_ticket<T>(
    tickets: &T,
    id: TicketId,
    scope: &TicketScope,
) -> Result<Ticket, Error>
where
    T: TicketRepository + ?Sized,
{
    let ticket = find_visible_ticket(tickets, id, scope).await?;
    if ticket.is_trashed() {
        return Err(ticket_not_found(id));
    }
    Ok(ticket)
}

pub(crate) fn timestamp_label(value: Option<DateTime<Utc>>) -> String {
    value.map_or_else(
        || NONE_LABEL.to_owned(),
        |at| at.format(NOTE_TIMESTAMP_FORMAT).to_string(),
    )
}

//! Port for ticket persistence.
//!
//! Mutating methods take the activity entries produced by the mutation and
//! must store them in the same transaction as the ticket row.

use async_trait::async_trait;
use pagination::Page;

use crate::domain::{
    ActivityEntry, NewTicket, Ticket, TicketId, TicketListQuery, TicketScope, UserId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by ticket repository adapters.
    pub enum TicketRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "ticket repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "ticket repository query failed: {message}",
        /// The tracking number unique constraint rejected an insert.
        DuplicateTrackingNumber { tracking_number: String } =>
            "tracking number {tracking_number} already exists",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TicketRepository: Send + Sync {
    /// Insert a ticket with its initial agents and activities, returning the
    /// stored ticket. Activities are attached to the new ticket id.
    async fn insert(
        &self,
        ticket: &NewTicket,
        agent_ids: &[UserId],
        activities: &[ActivityEntry],
    ) -> Result<Ticket, TicketRepositoryError>;

    /// Find a ticket visible under `scope`, trashed or not.
    async fn find_scoped(
        &self,
        id: TicketId,
        scope: &TicketScope,
    ) -> Result<Option<Ticket>, TicketRepositoryError>;

    /// Overwrite the mutable columns of `ticket` and append `activities`.
    async fn update(
        &self,
        ticket: &Ticket,
        activities: &[ActivityEntry],
    ) -> Result<(), TicketRepositoryError>;

    /// One page of tickets from a bucket, newest first, limited to `scope`.
    async fn list(
        &self,
        scope: &TicketScope,
        query: &TicketListQuery,
    ) -> Result<Page<Ticket>, TicketRepositoryError>;
}

//! Driving port for ticket lifecycle mutations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    Actor, BranchId, CustomerId, Error, PriorityId, Ticket, TicketId, TicketPatch, TicketStatus,
    TicketType, UserId,
};

/// Input for [`TicketCommand::create_ticket`].
///
/// Shape checks (non-empty issue, known status code) happen in the inbound
/// adapter; reference existence is checked by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTicketRequest {
    pub issue: String,
    pub description: Option<String>,
    pub priority_id: Option<PriorityId>,
    pub status: Option<TicketStatus>,
    pub ticket_type: TicketType,
    pub due_date: Option<DateTime<Utc>>,
    pub customer_id: Option<CustomerId>,
    pub branch_id: Option<BranchId>,
    pub agent_ids: Vec<UserId>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TicketCommand: Send + Sync {
    /// Create a ticket with a fresh tracking number.
    async fn create_ticket(&self, actor: &Actor, request: NewTicketRequest)
    -> Result<Ticket, Error>;

    /// Apply a sparse update, recording one activity per changed field.
    async fn update_ticket(
        &self,
        actor: &Actor,
        ticket_id: TicketId,
        patch: TicketPatch,
    ) -> Result<Ticket, Error>;

    /// Soft-delete a ticket.
    async fn delete_ticket(&self, actor: &Actor, ticket_id: TicketId) -> Result<(), Error>;

    /// Bring a trashed ticket back as `Open`.
    async fn restore_ticket(&self, actor: &Actor, ticket_id: TicketId) -> Result<Ticket, Error>;
}

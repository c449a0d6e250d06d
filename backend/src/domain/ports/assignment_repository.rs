//! Port for ticket assignment join rows.

use async_trait::async_trait;

use crate::domain::{ActivityEntry, Label, LabelId, TicketId, UserId};

use super::AgentSync;
use super::define_port_error;

define_port_error! {
    /// Errors raised by assignment repository adapters.
    pub enum AssignmentRepositoryError {
        Connection { message: String } =>
            "assignment repository connection failed: {message}",
        Query { message: String } =>
            "assignment repository query failed: {message}",
    }
}

/// One ticket association.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    Agent(UserId),
    NotifyUser(UserId),
    Label(LabelId),
}

/// One agent row to add or remove, with the activity logged if it changes.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentChange {
    pub user: UserId,
    pub activity: ActivityEntry,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    async fn agent_ids(&self, ticket: TicketId) -> Result<Vec<UserId>, AssignmentRepositoryError>;

    async fn notify_user_ids(
        &self,
        ticket: TicketId,
    ) -> Result<Vec<UserId>, AssignmentRepositoryError>;

    async fn labels(&self, ticket: TicketId) -> Result<Vec<Label>, AssignmentRepositoryError>;

    /// Insert the join row unless it exists. Returns `true` and appends
    /// `activity` in the same transaction only when a row was inserted.
    async fn attach(
        &self,
        ticket: TicketId,
        assignment: Assignment,
        activity: &ActivityEntry,
    ) -> Result<bool, AssignmentRepositoryError>;

    /// Delete the join row if present. Returns `true` and appends `activity`
    /// in the same transaction only when a row was deleted.
    async fn detach(
        &self,
        ticket: TicketId,
        assignment: Assignment,
        activity: &ActivityEntry,
    ) -> Result<bool, AssignmentRepositoryError>;

    /// Attach every `added` agent and detach every `removed` one atomically.
    /// Each activity is appended only when its row changed; the returned
    /// [`AgentSync`] lists those users.
    async fn sync_agents(
        &self,
        ticket: TicketId,
        added: &[AgentChange],
        removed: &[AgentChange],
    ) -> Result<AgentSync, AssignmentRepositoryError>;
}

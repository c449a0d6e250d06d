//! Driving port for agent, notify-user and label assignment.

use async_trait::async_trait;

use crate::domain::{Actor, Error, LabelId, TicketId, UserId};

/// Outcome of a bulk agent sync.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentSync {
    pub added: Vec<UserId>,
    pub removed: Vec<UserId>,
}

/// Every method resolves the ticket through the actor's scope first. Single
/// attach/detach methods return whether a join row actually changed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssignmentCommand: Send + Sync {
    async fn add_agent(&self, actor: &Actor, ticket: TicketId, user: UserId) -> Result<bool, Error>;

    async fn remove_agent(&self, actor: &Actor, ticket: TicketId, user: UserId)
    -> Result<bool, Error>;

    /// Make the agent set equal `agents`, touching only the difference.
    async fn sync_agents(
        &self,
        actor: &Actor,
        ticket: TicketId,
        agents: Vec<UserId>,
    ) -> Result<AgentSync, Error>;

    async fn add_notify_user(
        &self,
        actor: &Actor,
        ticket: TicketId,
        user: UserId,
    ) -> Result<bool, Error>;

    async fn remove_notify_user(
        &self,
        actor: &Actor,
        ticket: TicketId,
        user: UserId,
    ) -> Result<bool, Error>;

    async fn add_label(
        &self,
        actor: &Actor,
        ticket: TicketId,
        label: LabelId,
    ) -> Result<bool, Error>;

    async fn remove_label(
        &self,
        actor: &Actor,
        ticket: TicketId,
        label: LabelId,
    ) -> Result<bool, Error>;
}

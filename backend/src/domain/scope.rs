//! Role-based ticket visibility.
//!
//! Every ticket read or mutation resolves tickets through a [`TicketScope`]
//! built from the acting user. Storage adapters translate the scope into a
//! query predicate; [`TicketScope::permits`] is the reference semantics they
//! must agree with.

use crate::domain::{Actor, BranchId, Role, UserId};

/// Which tickets an actor may see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketScope {
    /// Every ticket.
    Unrestricted,
    /// Tickets where `user` is an agent or notify user. When `branch` is set,
    /// the ticket's branch must equal it or be unset.
    Assigned {
        user: UserId,
        branch: Option<BranchId>,
    },
    /// Tickets with at least one agent from this non-empty set.
    ManagedAgents(Vec<UserId>),
    /// Tickets in this branch.
    Branch(BranchId),
    /// No tickets at all.
    Nothing,
}

/// The ticket attributes visibility depends on.
#[derive(Debug, Clone, Copy)]
pub struct ScopeFacts<'a> {
    pub branch_id: Option<BranchId>,
    pub agent_ids: &'a [UserId],
    pub notify_user_ids: &'a [UserId],
}

impl TicketScope {
    /// Build the scope for `actor`.
    ///
    /// `managed_agent_ids` is only consulted for managers; a manager without
    /// agents sees nothing rather than everything.
    ///
    /// # Examples
    /// ```
    /// use helpdesk::domain::{Actor, Role, TicketScope, UserId};
    ///
    /// let manager = Actor::new(UserId::new(5).expect("id"), Role::Manager, None);
    /// assert_eq!(TicketScope::for_actor(&manager, Vec::new()), TicketScope::Nothing);
    /// ```
    pub fn for_actor(actor: &Actor, managed_agent_ids: Vec<UserId>) -> Self {
        match actor.role() {
            Role::Admin => Self::Unrestricted,
            Role::Agent => Self::Assigned {
                user: actor.id(),
                branch: actor.branch_id(),
            },
            Role::Manager if managed_agent_ids.is_empty() => Self::Nothing,
            Role::Manager => Self::ManagedAgents(managed_agent_ids),
            Role::BranchAdmin => match actor.branch_id() {
                Some(branch) => Self::Branch(branch),
                None => Self::Nothing,
            },
        }
    }

    pub fn is_nothing(&self) -> bool {
        matches!(self, Self::Nothing)
    }

    /// Whether a ticket with these attributes is visible.
    pub fn permits(&self, facts: ScopeFacts<'_>) -> bool {
        match self {
            Self::Unrestricted => true,
            Self::Assigned { user, branch } => {
                let involved =
                    facts.agent_ids.contains(user) || facts.notify_user_ids.contains(user);
                let in_branch = match (branch, facts.branch_id) {
                    (Some(own), Some(ticket_branch)) => *own == ticket_branch,
                    _ => true,
                };
                involved && in_branch
            }
            Self::ManagedAgents(agents) => facts.agent_ids.iter().any(|id| agents.contains(id)),
            Self::Branch(branch) => facts.branch_id == Some(*branch),
            Self::Nothing => false,
        }
    }
}

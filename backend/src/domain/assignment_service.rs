//! Agent, notify-user and label assignment.
//!
//! Join rows are idempotent: attaching an existing pair or detaching an
//! absent one changes nothing and logs nothing. The repository writes the
//! activity only when the row actually changed.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde_json::json;
use tracing::info;

use crate::domain::directory::reference_label;
use crate::domain::ports::{
    AgentChange, AgentSync, Assignment, AssignmentCommand, AssignmentRepository,
    DirectoryRepository, LabelRepository, TicketRepository,
};
use crate::domain::ticket_service_support::{
    find_live_ticket, map_assignment_error, map_directory_error, map_label_error, resolve_scope,
};
use crate::domain::{
    ActivityEntry, Actor, Error, FieldErrors, Label, LabelId, Ticket, TicketId, UserId, kinds,
};

/// Which user join table an operation touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UserRole {
    Agent,
    NotifyUser,
}

impl UserRole {
    fn assignment(self, user: UserId) -> Assignment {
        match self {
            Self::Agent => Assignment::Agent(user),
            Self::NotifyUser => Assignment::NotifyUser(user),
        }
    }

    fn attach_entry(
        self,
        name: &str,
        user: UserId,
        actor: &Actor,
        at: DateTime<Utc>,
    ) -> ActivityEntry {
        let (kind, note) = match self {
            Self::Agent => (kinds::AGENT_ASSIGNED, format!("{name} assigned as agent")),
            Self::NotifyUser => (kinds::NOTIFY_USER_ADDED, format!("{name} added to notify list")),
        };
        ActivityEntry::known(kind, note, actor.id(), at).with_extra(json!({ "userId": user }))
    }

    fn detach_entry(
        self,
        name: &str,
        user: UserId,
        actor: &Actor,
        at: DateTime<Utc>,
    ) -> ActivityEntry {
        let (kind, note) = match self {
            Self::Agent => (kinds::AGENT_REMOVED, format!("{name} removed as agent")),
            Self::NotifyUser => (
                kinds::NOTIFY_USER_REMOVED,
                format!("{name} removed from notify list"),
            ),
        };
        ActivityEntry::known(kind, note, actor.id(), at).with_extra(json!({ "userId": user }))
    }
}

/// Assignment service implementing [`AssignmentCommand`].
#[derive(Clone)]
pub struct AssignmentService<T, A, L, D> {
    tickets: Arc<T>,
    assignments: Arc<A>,
    labels: Arc<L>,
    directory: Arc<D>,
    clock: Arc<dyn Clock>,
}

impl<T, A, L, D> AssignmentService<T, A, L, D> {
    pub fn new(
        tickets: Arc<T>,
        assignments: Arc<A>,
        labels: Arc<L>,
        directory: Arc<D>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            tickets,
            assignments,
            labels,
            directory,
            clock,
        }
    }
}

impl<T, A, L, D> AssignmentService<T, A, L, D>
where
    T: TicketRepository,
    A: AssignmentRepository,
    L: LabelRepository,
    D: DirectoryRepository,
{
    async fn live_ticket(&self, actor: &Actor, ticket_id: TicketId) -> Result<Ticket, Error> {
        let scope = resolve_scope(self.directory.as_ref(), actor).await?;
        find_live_ticket(self.tickets.as_ref(), ticket_id, &scope).await
    }

    /// Display names for `users`; unknown ids are recorded against `field`.
    async fn require_users(
        &self,
        field: &'static str,
        users: &[UserId],
    ) -> Result<HashMap<UserId, String>, Error> {
        let mut errors = FieldErrors::new();
        let names: HashMap<UserId, String> = if users.is_empty() {
            HashMap::new()
        } else {
            self.directory
                .find_users(users)
                .await
                .map_err(map_directory_error)?
                .into_iter()
                .map(|user| (user.id, user.name))
                .collect()
        };
        for id in users.iter().filter(|id| !names.contains_key(id)) {
            errors.push(field, format!("user {id} does not exist"));
        }
        errors.finish()?;
        Ok(names)
    }

    async fn user_label(&self, user: UserId) -> Result<String, Error> {
        let name = self
            .directory
            .find_user(user)
            .await
            .map_err(map_directory_error)?
            .map(|found| found.name);
        Ok(reference_label(Some(user), name))
    }

    async fn attach_user(
        &self,
        actor: &Actor,
        ticket_id: TicketId,
        user: UserId,
        role: UserRole,
    ) -> Result<bool, Error> {
        let ticket = self.live_ticket(actor, ticket_id).await?;
        let names = self.require_users("userId", &[user]).await?;
        let name = reference_label(Some(user), names.get(&user).cloned());
        let entry = role.attach_entry(&name, user, actor, self.clock.utc());
        let attached = self
            .assignments
            .attach(ticket.id, role.assignment(user), &entry)
            .await
            .map_err(map_assignment_error)?;
        if attached {
            info!(
                ticket_id = %ticket.id,
                actor_id = %actor.id(),
                user_id = %user,
                kind = entry.kind.as_str(),
                "user attached"
            );
        }
        Ok(attached)
    }

    async fn detach_user(
        &self,
        actor: &Actor,
        ticket_id: TicketId,
        user: UserId,
        role: UserRole,
    ) -> Result<bool, Error> {
        let ticket = self.live_ticket(actor, ticket_id).await?;
        let name = self.user_label(user).await?;
        let entry = role.detach_entry(&name, user, actor, self.clock.utc());
        let detached = self
            .assignments
            .detach(ticket.id, role.assignment(user), &entry)
            .await
            .map_err(map_assignment_error)?;
        if detached {
            info!(
                ticket_id = %ticket.id,
                actor_id = %actor.id(),
                user_id = %user,
                kind = entry.kind.as_str(),
                "user detached"
            );
        }
        Ok(detached)
    }

    async fn find_label(&self, id: LabelId) -> Result<Option<Label>, Error> {
        self.labels.find(id).await.map_err(map_label_error)
    }

    fn label_entry(
        kind: &'static str,
        verb: &str,
        label: LabelId,
        name: &str,
        actor: &Actor,
        at: DateTime<Utc>,
    ) -> ActivityEntry {
        ActivityEntry::known(kind, format!("Label {name} {verb}"), actor.id(), at)
            .with_extra(json!({ "labelId": label, "name": name }))
    }
}

#[async_trait]
impl<T, A, L, D> AssignmentCommand for AssignmentService<T, A, L, D>
where
    T: TicketRepository,
    A: AssignmentRepository,
    L: LabelRepository,
    D: DirectoryRepository,
{
    async fn add_agent(
        &self,
        actor: &Actor,
        ticket: TicketId,
        user: UserId,
    ) -> Result<bool, Error> {
        self.attach_user(actor, ticket, user, UserRole::Agent).await
    }

    async fn remove_agent(
        &self,
        actor: &Actor,
        ticket: TicketId,
        user: UserId,
    ) -> Result<bool, Error> {
        self.detach_user(actor, ticket, user, UserRole::Agent).await
    }

    async fn sync_agents(
        &self,
        actor: &Actor,
        ticket_id: TicketId,
        agents: Vec<UserId>,
    ) -> Result<AgentSync, Error> {
        let ticket = self.live_ticket(actor, ticket_id).await?;

        let mut wanted: Vec<UserId> = Vec::with_capacity(agents.len());
        for id in agents {
            if !wanted.contains(&id) {
                wanted.push(id);
            }
        }
        let current = self
            .assignments
            .agent_ids(ticket.id)
            .await
            .map_err(map_assignment_error)?;
        let to_add: Vec<UserId> = wanted
            .iter()
            .copied()
            .filter(|id| !current.contains(id))
            .collect();
        let to_remove: Vec<UserId> = current
            .iter()
            .copied()
            .filter(|id| !wanted.contains(id))
            .collect();

        let added_names = self.require_users("agentIds", &to_add).await?;
        let removed_names: HashMap<UserId, String> = if to_remove.is_empty() {
            HashMap::new()
        } else {
            self.directory
                .find_users(&to_remove)
                .await
                .map_err(map_directory_error)?
                .into_iter()
                .map(|user| (user.id, user.name))
                .collect()
        };

        let now = self.clock.utc();
        let added: Vec<AgentChange> = to_add
            .into_iter()
            .map(|user| {
                let name = reference_label(Some(user), added_names.get(&user).cloned());
                AgentChange {
                    user,
                    activity: UserRole::Agent.attach_entry(&name, user, actor, now),
                }
            })
            .collect();
        let removed: Vec<AgentChange> = to_remove
            .into_iter()
            .map(|user| {
                let name = reference_label(Some(user), removed_names.get(&user).cloned());
                AgentChange {
                    user,
                    activity: UserRole::Agent.detach_entry(&name, user, actor, now),
                }
            })
            .collect();
        let outcome = self
            .assignments
            .sync_agents(ticket.id, &added, &removed)
            .await
            .map_err(map_assignment_error)?;

        info!(
            ticket_id = %ticket.id,
            actor_id = %actor.id(),
            added = outcome.added.len(),
            removed = outcome.removed.len(),
            "agents synchronised"
        );
        Ok(outcome)
    }

    async fn add_notify_user(
        &self,
        actor: &Actor,
        ticket: TicketId,
        user: UserId,
    ) -> Result<bool, Error> {
        self.attach_user(actor, ticket, user, UserRole::NotifyUser).await
    }

    async fn remove_notify_user(
        &self,
        actor: &Actor,
        ticket: TicketId,
        user: UserId,
    ) -> Result<bool, Error> {
        self.detach_user(actor, ticket, user, UserRole::NotifyUser).await
    }

    async fn add_label(
        &self,
        actor: &Actor,
        ticket_id: TicketId,
        label: LabelId,
    ) -> Result<bool, Error> {
        let ticket = self.live_ticket(actor, ticket_id).await?;
        let Some(found) = self.find_label(label).await? else {
            return Err(FieldErrors::single(
                "labelId",
                format!("label {label} does not exist"),
            ));
        };
        let entry = Self::label_entry(
            kinds::LABEL_ADDED,
            "added",
            label,
            found.name.as_str(),
            actor,
            self.clock.utc(),
        );
        let attached = self
            .assignments
            .attach(ticket.id, Assignment::Label(label), &entry)
            .await
            .map_err(map_assignment_error)?;
        if attached {
            info!(
                ticket_id = %ticket.id,
                actor_id = %actor.id(),
                label_id = %label,
                "label attached"
            );
        }
        Ok(attached)
    }

    async fn remove_label(
        &self,
        actor: &Actor,
        ticket_id: TicketId,
        label: LabelId,
    ) -> Result<bool, Error> {
        let ticket = self.live_ticket(actor, ticket_id).await?;
        let name = reference_label(
            Some(label),
            self.find_label(label)
                .await?
                .map(|found| found.name.as_str().to_owned()),
        );
        let entry = Self::label_entry(
            kinds::LABEL_REMOVED,
            "removed",
            label,
            &name,
            actor,
            self.clock.utc(),
        );
        let detached = self
            .assignments
            .detach(ticket.id, Assignment::Label(label), &entry)
            .await
            .map_err(map_assignment_error)?;
        if detached {
            info!(
                ticket_id = %ticket.id,
                actor_id = %actor.id(),
                label_id = %label,
                "label detached"
            );
        }
        Ok(detached)
    }
}

#[cfg(test)]
#[path = "assignment_service_tests.rs"]
mod tests;

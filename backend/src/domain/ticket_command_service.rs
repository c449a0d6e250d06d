//! Ticket lifecycle command service.
//!
//! Creates tickets with fresh tracking numbers, applies sparse updates with
//! one audit activity per changed field, and moves tickets in and out of the
//! trash. Every mutation resolves the ticket through the actor's scope and
//! hands the activities to the repository so both land in one transaction.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{info, warn};

use crate::domain::directory::reference_label;
use crate::domain::ports::{
    DirectoryRepository, NewTicketRequest, TicketCommand, TicketRepository,
    TicketRepositoryError, TrackingSequence,
};
use crate::domain::ticket_service_support::{
    find_live_ticket, find_visible_ticket, map_directory_error, map_sequence_error,
    map_ticket_error, resolve_scope, ticket_not_found, timestamp_label,
};
use crate::domain::{
    ActivityEntry, Actor, BranchId, CustomerId, Error, FieldErrors, FieldUpdate, NewTicket,
    PriorityId, Role, Ticket, TicketChange, TicketId, TicketPatch, TicketStatus, TrackingNumber,
    UserId, kinds, normalize_issue, ticket_slug,
};

/// Tracking number allocations attempted before giving up on collisions.
pub(crate) const TRACKING_ATTEMPTS: usize = 5;

/// Ticket lifecycle service implementing [`TicketCommand`].
#[derive(Clone)]
pub struct TicketCommandService<T, S, D> {
    tickets: Arc<T>,
    sequence: Arc<S>,
    directory: Arc<D>,
    clock: Arc<dyn Clock>,
}

impl<T, S, D> TicketCommandService<T, S, D> {
    /// Create the service from its ports and a clock.
    ///
    /// # Examples
    /// ```
    /// # use std::sync::Arc;
    /// # use helpdesk::domain::TicketCommandService;
    /// # use helpdesk::outbound::memory::InMemoryStore;
    /// # use mockable::DefaultClock;
    /// let store = Arc::new(InMemoryStore::default());
    /// let _service = TicketCommandService::new(
    ///     store.clone(),
    ///     store.clone(),
    ///     store,
    ///     Arc::new(DefaultClock),
    /// );
    /// ```
    pub fn new(
        tickets: Arc<T>,
        sequence: Arc<S>,
        directory: Arc<D>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            tickets,
            sequence,
            directory,
            clock,
        }
    }
}

fn trimmed_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}

fn dedupe(ids: Vec<UserId>) -> Vec<UserId> {
    let mut seen = Vec::with_capacity(ids.len());
    for id in ids {
        if !seen.contains(&id) {
            seen.push(id);
        }
    }
    seen
}

impl<T, S, D> TicketCommandService<T, S, D>
where
    T: TicketRepository,
    S: TrackingSequence,
    D: DirectoryRepository,
{
    async fn check_customer(
        &self,
        errors: &mut FieldErrors,
        id: Option<CustomerId>,
    ) -> Result<(), Error> {
        let Some(id) = id else { return Ok(()) };
        let found = self
            .directory
            .customer_name(id)
            .await
            .map_err(map_directory_error)?;
        if found.is_none() {
            errors.push("customerId", format!("customer {id} does not exist"));
        }
        Ok(())
    }

    async fn check_branch(
        &self,
        errors: &mut FieldErrors,
        id: Option<BranchId>,
    ) -> Result<(), Error> {
        let Some(id) = id else { return Ok(()) };
        let found = self
            .directory
            .branch_name(id)
            .await
            .map_err(map_directory_error)?;
        if found.is_none() {
            errors.push("branchId", format!("branch {id} does not exist"));
        }
        Ok(())
    }

    async fn check_priority(
        &self,
        errors: &mut FieldErrors,
        id: Option<PriorityId>,
    ) -> Result<(), Error> {
        let Some(id) = id else { return Ok(()) };
        let found = self
            .directory
            .priority_name(id)
            .await
            .map_err(map_directory_error)?;
        if found.is_none() {
            errors.push("priorityId", format!("priority {id} does not exist"));
        }
        Ok(())
    }

    /// Resolve agent display names, recording unknown ids against `agentIds`.
    async fn agent_names(
        &self,
        errors: &mut FieldErrors,
        agent_ids: &[UserId],
    ) -> Result<HashMap<UserId, String>, Error> {
        if agent_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let names: HashMap<UserId, String> = self
            .directory
            .find_users(agent_ids)
            .await
            .map_err(map_directory_error)?
            .into_iter()
            .map(|user| (user.id, user.name))
            .collect();
        for id in agent_ids.iter().filter(|id| !names.contains_key(id)) {
            errors.push("agentIds", format!("user {id} does not exist"));
        }
        Ok(names)
    }

    async fn validate_patch(&self, patch: &mut TicketPatch) -> Result<(), Error> {
        let mut errors = FieldErrors::new();
        if let Some(issue) = patch.issue.take() {
            patch.issue = errors.check("issue", normalize_issue(&issue));
        }
        patch.description = match std::mem::take(&mut patch.description) {
            FieldUpdate::Set(text) => match trimmed_text(Some(text)) {
                Some(text) => FieldUpdate::Set(text),
                None => FieldUpdate::Clear,
            },
            other => other,
        };
        self.check_customer(&mut errors, patch.customer_id.as_set().copied())
            .await?;
        self.check_branch(&mut errors, patch.branch_id.as_set().copied())
            .await?;
        self.check_priority(&mut errors, patch.priority_id.as_set().copied())
            .await?;
        errors.finish()
    }

    fn default_branch(actor: &Actor, requested: Option<BranchId>) -> Option<BranchId> {
        requested.or(match actor.role() {
            Role::Agent | Role::BranchAdmin => actor.branch_id(),
            Role::Admin | Role::Manager => None,
        })
    }

    async fn status_label(&self, status: TicketStatus) -> Result<String, Error> {
        let name = self
            .directory
            .status_name(status)
            .await
            .map_err(map_directory_error)?;
        Ok(name.unwrap_or_else(|| status.label().to_owned()))
    }

    async fn priority_label(&self, id: Option<PriorityId>) -> Result<String, Error> {
        let name = match id {
            Some(id) => self
                .directory
                .priority_name(id)
                .await
                .map_err(map_directory_error)?,
            None => None,
        };
        Ok(reference_label(id, name))
    }

    async fn branch_label(&self, id: Option<BranchId>) -> Result<String, Error> {
        let name = match id {
            Some(id) => self
                .directory
                .branch_name(id)
                .await
                .map_err(map_directory_error)?,
            None => None,
        };
        Ok(reference_label(id, name))
    }

    async fn customer_label(&self, id: Option<CustomerId>) -> Result<String, Error> {
        let name = match id {
            Some(id) => self
                .directory
                .customer_name(id)
                .await
                .map_err(map_directory_error)?,
            None => None,
        };
        Ok(reference_label(id, name))
    }

    /// Turn one field change into its activity entry with resolved labels.
    async fn change_entry(
        &self,
        change: &TicketChange,
        actor: &Actor,
    ) -> Result<ActivityEntry, Error> {
        let by = actor.id();
        let at = self.clock.utc();
        let entry = match change {
            TicketChange::Status { from, to } => ActivityEntry::field_change(
                kinds::STATUS_CHANGED,
                "Status",
                &self.status_label(*from).await?,
                &self.status_label(*to).await?,
                by,
                at,
            ),
            TicketChange::Priority { from, to } => ActivityEntry::field_change(
                kinds::PRIORITY_CHANGED,
                "Priority",
                &self.priority_label(*from).await?,
                &self.priority_label(*to).await?,
                by,
                at,
            ),
            TicketChange::Branch { from, to } => ActivityEntry::field_change(
                kinds::BRANCH_CHANGED,
                "Branch",
                &self.branch_label(*from).await?,
                &self.branch_label(*to).await?,
                by,
                at,
            ),
            TicketChange::DueDate { from, to } => ActivityEntry::field_change(
                kinds::DUE_DATE_CHANGED,
                "Due date",
                &timestamp_label(*from),
                &timestamp_label(*to),
                by,
                at,
            ),
            TicketChange::ClosedTime { from, to } => ActivityEntry::field_change(
                kinds::CLOSED_TIME_CHANGED,
                "Closed time",
                &timestamp_label(*from),
                &timestamp_label(*to),
                by,
                at,
            ),
            TicketChange::Customer { from, to } => ActivityEntry::field_change(
                kinds::CUSTOMER_CHANGED,
                "Customer",
                &self.customer_label(*from).await?,
                &self.customer_label(*to).await?,
                by,
                at,
            ),
            TicketChange::Details => {
                ActivityEntry::known(kinds::DETAILS_UPDATED, "Ticket details updated", by, at)
            }
        };
        Ok(entry)
    }

    fn creation_activities(
        new_ticket: &NewTicket,
        agent_ids: &[UserId],
        agent_names: &HashMap<UserId, String>,
    ) -> Vec<ActivityEntry> {
        let by = new_ticket.created_by;
        let at = new_ticket.created_at;
        let created = ActivityEntry::known(
            kinds::TICKET_CREATED,
            format!("Ticket {} created", new_ticket.tracking_number),
            by,
            at,
        )
        .with_extra(json!({ "trackingNumber": new_ticket.tracking_number.as_str() }));

        std::iter::once(created)
            .chain(agent_ids.iter().map(|id| {
                let name = reference_label(Some(*id), agent_names.get(id).cloned());
                ActivityEntry::known(
                    kinds::AGENT_ASSIGNED,
                    format!("{name} assigned as agent"),
                    by,
                    at,
                )
                .with_extra(json!({ "userId": id }))
            }))
            .collect()
    }

    async fn persist_trash_change(
        &self,
        actor: &Actor,
        ticket: &Ticket,
        kind: &'static str,
        verb: &str,
    ) -> Result<(), Error> {
        let entry = ActivityEntry::known(
            kind,
            format!("Ticket {} {verb}", ticket.tracking_number),
            actor.id(),
            ticket.updated_at,
        );
        self.tickets
            .update(ticket, std::slice::from_ref(&entry))
            .await
            .map_err(map_ticket_error)
    }
}

#[async_trait]
impl<T, S, D> TicketCommand for TicketCommandService<T, S, D>
where
    T: TicketRepository,
    S: TrackingSequence,
    D: DirectoryRepository,
{
    async fn create_ticket(
        &self,
        actor: &Actor,
        request: NewTicketRequest,
    ) -> Result<Ticket, Error> {
        let mut errors = FieldErrors::new();
        let issue = errors
            .check("issue", normalize_issue(&request.issue))
            .unwrap_or_default();
        self.check_customer(&mut errors, request.customer_id).await?;
        self.check_branch(&mut errors, request.branch_id).await?;
        self.check_priority(&mut errors, request.priority_id).await?;
        let agent_ids = dedupe(request.agent_ids);
        let agent_names = self.agent_names(&mut errors, &agent_ids).await?;
        errors.finish()?;

        let now = self.clock.utc();
        let status = request.status.unwrap_or(TicketStatus::Open);
        let branch_id = Self::default_branch(actor, request.branch_id);
        let description = trimmed_text(request.description);

        for attempt in 1..=TRACKING_ATTEMPTS {
            let value = self.sequence.next_value().await.map_err(map_sequence_error)?;
            let tracking_number = TrackingNumber::allocate(request.ticket_type, value)
                .map_err(|err| Error::internal(err.to_string()))?;
            let new_ticket = NewTicket {
                slug: ticket_slug(&issue, &tracking_number),
                tracking_number,
                issue: issue.clone(),
                description: description.clone(),
                priority_id: request.priority_id,
                status,
                ticket_type: request.ticket_type,
                due_date: request.due_date,
                closed_at: (status == TicketStatus::Closed).then_some(now),
                customer_id: request.customer_id,
                created_by: actor.id(),
                branch_id,
                created_at: now,
            };
            let activities = Self::creation_activities(&new_ticket, &agent_ids, &agent_names);

            match self.tickets.insert(&new_ticket, &agent_ids, &activities).await {
                Ok(ticket) => {
                    info!(
                        ticket_id = %ticket.id,
                        actor_id = %actor.id(),
                        tracking_number = %ticket.tracking_number,
                        "ticket created"
                    );
                    return Ok(ticket);
                }
                Err(TicketRepositoryError::DuplicateTrackingNumber { tracking_number }) => {
                    warn!(%tracking_number, attempt, "tracking number collision, reallocating");
                }
                Err(err) => return Err(map_ticket_error(err)),
            }
        }

        Err(Error::internal(format!(
            "no free tracking number after {TRACKING_ATTEMPTS} attempts"
        )))
    }

    async fn update_ticket(
        &self,
        actor: &Actor,
        ticket_id: TicketId,
        mut patch: TicketPatch,
    ) -> Result<Ticket, Error> {
        let scope = resolve_scope(self.directory.as_ref(), actor).await?;
        let mut ticket = find_live_ticket(self.tickets.as_ref(), ticket_id, &scope).await?;
        self.validate_patch(&mut patch).await?;

        let changes = ticket.apply_patch(&patch, self.clock.utc());
        if changes.is_empty() {
            return Ok(ticket);
        }

        let mut activities = Vec::with_capacity(changes.len());
        for change in &changes {
            activities.push(self.change_entry(change, actor).await?);
        }
        self.tickets
            .update(&ticket, &activities)
            .await
            .map_err(map_ticket_error)?;

        info!(
            ticket_id = %ticket.id,
            actor_id = %actor.id(),
            changes = activities.len(),
            "ticket updated"
        );
        Ok(ticket)
    }

    async fn delete_ticket(&self, actor: &Actor, ticket_id: TicketId) -> Result<(), Error> {
        let scope = resolve_scope(self.directory.as_ref(), actor).await?;
        let mut ticket = find_live_ticket(self.tickets.as_ref(), ticket_id, &scope).await?;
        if !ticket.can_be_trashed_by(actor) {
            return Err(Error::forbidden(
                "only the creator, an admin or a manager may delete this ticket",
            ));
        }

        ticket.trash(self.clock.utc());
        self.persist_trash_change(actor, &ticket, kinds::TICKET_DELETED, "deleted")
            .await?;
        info!(ticket_id = %ticket.id, actor_id = %actor.id(), "ticket moved to trash");
        Ok(())
    }

    async fn restore_ticket(&self, actor: &Actor, ticket_id: TicketId) -> Result<Ticket, Error> {
        let scope = resolve_scope(self.directory.as_ref(), actor).await?;
        let mut ticket = find_visible_ticket(self.tickets.as_ref(), ticket_id, &scope).await?;
        if !ticket.is_trashed() {
            return Err(ticket_not_found(ticket_id));
        }
        if !ticket.can_be_trashed_by(actor) {
            return Err(Error::forbidden(
                "only the creator, an admin or a manager may restore this ticket",
            ));
        }

        ticket.restore(self.clock.utc());
        self.persist_trash_change(actor, &ticket, kinds::TICKET_RESTORED, "restored")
            .await?;
        info!(ticket_id = %ticket.id, actor_id = %actor.id(), "ticket restored");
        Ok(ticket)
    }
}

#[cfg(test)]
#[path = "ticket_command_service_tests.rs"]
mod tests;

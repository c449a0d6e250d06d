//! Port implementations for [`InMemoryStore`].

use std::sync::atomic::Ordering;

use async_trait::async_trait;
use pagination::{Page, PageRequest};

use crate::domain::listing::newest_first;
use crate::domain::ports::{
    ActivityRepository, ActivityRepositoryError, AgentChange, AgentSync, Assignment,
    AssignmentRepository, AssignmentRepositoryError, DirectoryRepository,
    DirectoryRepositoryError, LabelDeletion, LabelRepository, LabelRepositoryError,
    TicketRepository, TicketRepositoryError, TrackingSequence, TrackingSequenceError,
};
use crate::domain::{
    Activity, ActivityEntry, BranchId, CustomerId, DirectoryUser, Label, LabelId, NewLabel,
    NewTicket, PriorityId, TaskId, Ticket, TicketId, TicketListQuery, TicketScope, TicketStatus,
    UserId,
};

use super::{InMemoryStore, State};

const ID_EXHAUSTED: &str = "id space exhausted";

fn append_all(
    state: &mut State,
    ticket: TicketId,
    activities: &[ActivityEntry],
) -> Result<(), TicketRepositoryError> {
    for entry in activities {
        state
            .append_activity(ticket, entry)
            .ok_or_else(|| TicketRepositoryError::query(ID_EXHAUSTED))?;
    }
    Ok(())
}

#[async_trait]
impl TicketRepository for InMemoryStore {
    async fn insert(
        &self,
        ticket: &NewTicket,
        agent_ids: &[UserId],
        activities: &[ActivityEntry],
    ) -> Result<Ticket, TicketRepositoryError> {
        let mut state = self.lock(TicketRepositoryError::connection)?;
        if state
            .tickets
            .values()
            .any(|existing| existing.tracking_number == ticket.tracking_number)
        {
            return Err(TicketRepositoryError::duplicate_tracking_number(
                ticket.tracking_number.as_str(),
            ));
        }

        let id = state
            .next_ticket_id()
            .ok_or_else(|| TicketRepositoryError::query(ID_EXHAUSTED))?;
        let stored = ticket.clone().into_ticket(id);
        state.tickets.insert(id, stored.clone());
        state
            .ticket_agents
            .extend(agent_ids.iter().map(|agent| (id, *agent)));
        append_all(&mut state, id, activities)?;
        Ok(stored)
    }

    async fn find_scoped(
        &self,
        id: TicketId,
        scope: &TicketScope,
    ) -> Result<Option<Ticket>, TicketRepositoryError> {
        let state = self.lock(TicketRepositoryError::connection)?;
        Ok(state
            .tickets
            .get(&id)
            .filter(|ticket| state.is_visible(ticket, scope))
            .cloned())
    }

    async fn update(
        &self,
        ticket: &Ticket,
        activities: &[ActivityEntry],
    ) -> Result<(), TicketRepositoryError> {
        let mut state = self.lock(TicketRepositoryError::connection)?;
        let Some(row) = state.tickets.get_mut(&ticket.id) else {
            return Err(TicketRepositoryError::query(format!(
                "ticket {} does not exist",
                ticket.id
            )));
        };
        row.clone_from(ticket);
        append_all(&mut state, ticket.id, activities)
    }

    async fn list(
        &self,
        scope: &TicketScope,
        query: &TicketListQuery,
    ) -> Result<Page<Ticket>, TicketRepositoryError> {
        if scope.is_nothing() {
            return Ok(Page::empty(query.page));
        }
        let state = self.lock(TicketRepositoryError::connection)?;
        let mut matching: Vec<Ticket> = state
            .tickets
            .values()
            .filter(|ticket| query.bucket.contains(ticket))
            .filter(|ticket| query.filter.matches(ticket))
            .filter(|ticket| state.is_visible(ticket, scope))
            .cloned()
            .collect();
        matching.sort_by(newest_first);
        Ok(Page::from_full(matching, query.page))
    }
}

#[async_trait]
impl TrackingSequence for InMemoryStore {
    async fn next_value(&self) -> Result<u64, TrackingSequenceError> {
        let previous = self.tracking.fetch_add(1, Ordering::SeqCst);
        previous
            .checked_add(1)
            .ok_or_else(|| TrackingSequenceError::query("tracking sequence overflowed"))
    }
}

#[async_trait]
impl AssignmentRepository for InMemoryStore {
    async fn agent_ids(&self, ticket: TicketId) -> Result<Vec<UserId>, AssignmentRepositoryError> {
        let state = self.lock(AssignmentRepositoryError::connection)?;
        Ok(state.agent_ids(ticket))
    }

    async fn notify_user_ids(
        &self,
        ticket: TicketId,
    ) -> Result<Vec<UserId>, AssignmentRepositoryError> {
        let state = self.lock(AssignmentRepositoryError::connection)?;
        Ok(state.notify_user_ids(ticket))
    }

    async fn labels(&self, ticket: TicketId) -> Result<Vec<Label>, AssignmentRepositoryError> {
        let state = self.lock(AssignmentRepositoryError::connection)?;
        let mut labels: Vec<Label> = state
            .label_ids(ticket)
            .into_iter()
            .filter_map(|id| state.labels.get(&id).cloned())
            .collect();
        labels.sort_by(|a, b| a.name.as_str().cmp(b.name.as_str()));
        Ok(labels)
    }

    async fn attach(
        &self,
        ticket: TicketId,
        assignment: Assignment,
        activity: &ActivityEntry,
    ) -> Result<bool, AssignmentRepositoryError> {
        let mut state = self.lock(AssignmentRepositoryError::connection)?;
        if !state.tickets.contains_key(&ticket) {
            return Err(AssignmentRepositoryError::query(format!(
                "ticket {ticket} does not exist"
            )));
        }
        if !state.assignment_rows(ticket, assignment).insert() {
            return Ok(false);
        }
        state
            .append_activity(ticket, activity)
            .ok_or_else(|| AssignmentRepositoryError::query(ID_EXHAUSTED))?;
        Ok(true)
    }

    async fn detach(
        &self,
        ticket: TicketId,
        assignment: Assignment,
        activity: &ActivityEntry,
    ) -> Result<bool, AssignmentRepositoryError> {
        let mut state = self.lock(AssignmentRepositoryError::connection)?;
        if !state.assignment_rows(ticket, assignment).remove() {
            return Ok(false);
        }
        state
            .append_activity(ticket, activity)
            .ok_or_else(|| AssignmentRepositoryError::query(ID_EXHAUSTED))?;
        Ok(true)
    }

    async fn sync_agents(
        &self,
        ticket: TicketId,
        added: &[AgentChange],
        removed: &[AgentChange],
    ) -> Result<AgentSync, AssignmentRepositoryError> {
        let mut state = self.lock(AssignmentRepositoryError::connection)?;
        if !state.tickets.contains_key(&ticket) {
            return Err(AssignmentRepositoryError::query(format!(
                "ticket {ticket} does not exist"
            )));
        }
        // Activity ids must not run out halfway through the batch.
        let needed = i64::try_from(added.len() + removed.len())
            .map_err(|_| AssignmentRepositoryError::query(ID_EXHAUSTED))?;
        if state.last_activity_id.checked_add(needed).is_none() {
            return Err(AssignmentRepositoryError::query(ID_EXHAUSTED));
        }

        let mut outcome = AgentSync::default();
        for change in added {
            if state
                .assignment_rows(ticket, Assignment::Agent(change.user))
                .insert()
            {
                state
                    .append_activity(ticket, &change.activity)
                    .ok_or_else(|| AssignmentRepositoryError::query(ID_EXHAUSTED))?;
                outcome.added.push(change.user);
            }
        }
        for change in removed {
            if state
                .assignment_rows(ticket, Assignment::Agent(change.user))
                .remove()
            {
                state
                    .append_activity(ticket, &change.activity)
                    .ok_or_else(|| AssignmentRepositoryError::query(ID_EXHAUSTED))?;
                outcome.removed.push(change.user);
            }
        }
        Ok(outcome)
    }
}

#[async_trait]
impl ActivityRepository for InMemoryStore {
    async fn append(
        &self,
        ticket: TicketId,
        entry: &ActivityEntry,
    ) -> Result<Activity, ActivityRepositoryError> {
        let mut state = self.lock(ActivityRepositoryError::connection)?;
        if !state.tickets.contains_key(&ticket) {
            return Err(ActivityRepositoryError::query(format!(
                "ticket {ticket} does not exist"
            )));
        }
        state
            .append_activity(ticket, entry)
            .ok_or_else(|| ActivityRepositoryError::query(ID_EXHAUSTED))
    }

    async fn list(
        &self,
        ticket: TicketId,
        task: Option<TaskId>,
        page: PageRequest,
    ) -> Result<Page<Activity>, ActivityRepositoryError> {
        let state = self.lock(ActivityRepositoryError::connection)?;
        let mut matching: Vec<Activity> = state
            .activities
            .iter()
            .filter(|activity| activity.ticket_id == ticket)
            .filter(|activity| task.is_none_or(|wanted| activity.task_id == Some(wanted)))
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(Page::from_full(matching, page))
    }
}

#[async_trait]
impl LabelRepository for InMemoryStore {
    async fn list(&self) -> Result<Vec<Label>, LabelRepositoryError> {
        let state = self.lock(LabelRepositoryError::connection)?;
        let mut labels: Vec<Label> = state.labels.values().cloned().collect();
        labels.sort_by(|a, b| a.name.as_str().cmp(b.name.as_str()));
        Ok(labels)
    }

    async fn find(&self, id: LabelId) -> Result<Option<Label>, LabelRepositoryError> {
        let state = self.lock(LabelRepositoryError::connection)?;
        Ok(state.labels.get(&id).cloned())
    }

    async fn insert(&self, label: &NewLabel) -> Result<Label, LabelRepositoryError> {
        let mut state = self.lock(LabelRepositoryError::connection)?;
        if state
            .labels
            .values()
            .any(|existing| existing.name == label.name)
        {
            return Err(LabelRepositoryError::duplicate_name(label.name.as_str()));
        }
        let id = state
            .next_label_id()
            .ok_or_else(|| LabelRepositoryError::query(ID_EXHAUSTED))?;
        let stored = Label {
            id,
            name: label.name.clone(),
            color: label.color.clone(),
        };
        state.labels.insert(id, stored.clone());
        Ok(stored)
    }

    async fn delete(&self, id: LabelId) -> Result<LabelDeletion, LabelRepositoryError> {
        let mut state = self.lock(LabelRepositoryError::connection)?;
        if !state.labels.contains_key(&id) {
            return Ok(LabelDeletion::Missing);
        }
        if state.ticket_labels.iter().any(|(_, label)| *label == id) {
            return Ok(LabelDeletion::InUse);
        }
        state.labels.remove(&id);
        Ok(LabelDeletion::Deleted)
    }
}

#[async_trait]
impl DirectoryRepository for InMemoryStore {
    async fn find_user(
        &self,
        id: UserId,
    ) -> Result<Option<DirectoryUser>, DirectoryRepositoryError> {
        let state = self.lock(DirectoryRepositoryError::connection)?;
        Ok(state.users.get(&id).cloned())
    }

    async fn find_users(
        &self,
        ids: &[UserId],
    ) -> Result<Vec<DirectoryUser>, DirectoryRepositoryError> {
        let state = self.lock(DirectoryRepositoryError::connection)?;
        Ok(state
            .users
            .values()
            .filter(|user| ids.contains(&user.id))
            .cloned()
            .collect())
    }

    async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<DirectoryUser>, DirectoryRepositoryError> {
        let state = self.lock(DirectoryRepositoryError::connection)?;
        Ok(state
            .users
            .values()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn managed_agent_ids(
        &self,
        manager: UserId,
    ) -> Result<Vec<UserId>, DirectoryRepositoryError> {
        let state = self.lock(DirectoryRepositoryError::connection)?;
        Ok(state
            .manager_agents
            .iter()
            .filter(|(owner, _)| *owner == manager)
            .map(|(_, agent)| *agent)
            .collect())
    }

    async fn branch_name(&self, id: BranchId) -> Result<Option<String>, DirectoryRepositoryError> {
        let state = self.lock(DirectoryRepositoryError::connection)?;
        Ok(state.branches.get(&id).cloned())
    }

    async fn priority_name(
        &self,
        id: PriorityId,
    ) -> Result<Option<String>, DirectoryRepositoryError> {
        let state = self.lock(DirectoryRepositoryError::connection)?;
        Ok(state.priorities.get(&id).cloned())
    }

    async fn status_name(
        &self,
        status: TicketStatus,
    ) -> Result<Option<String>, DirectoryRepositoryError> {
        let state = self.lock(DirectoryRepositoryError::connection)?;
        Ok(state.statuses.get(&status).cloned())
    }

    async fn customer_name(
        &self,
        id: CustomerId,
    ) -> Result<Option<String>, DirectoryRepositoryError> {
        let state = self.lock(DirectoryRepositoryError::connection)?;
        Ok(state.customers.get(&id).cloned())
    }
}

//! Scoped ticket reads: details, bucket listings and activity pages.

use std::sync::Arc;

use async_trait::async_trait;
use pagination::{Page, PageRequest};
use tracing::debug;

use crate::domain::ports::{
    ActivityRepository, AssignmentRepository, DirectoryRepository, TicketQuery, TicketRepository,
};
use crate::domain::ticket_service_support::{
    find_live_ticket, find_visible_ticket, map_activity_error, map_assignment_error,
    map_ticket_error, resolve_scope,
};
use crate::domain::{
    Activity, Actor, Error, TaskId, Ticket, TicketDetails, TicketId, TicketListQuery,
};

/// Ticket read service implementing [`TicketQuery`].
#[derive(Clone)]
pub struct TicketQueryService<T, A, V, D> {
    tickets: Arc<T>,
    assignments: Arc<A>,
    activities: Arc<V>,
    directory: Arc<D>,
}

impl<T, A, V, D> TicketQueryService<T, A, V, D> {
    pub fn new(
        tickets: Arc<T>,
        assignments: Arc<A>,
        activities: Arc<V>,
        directory: Arc<D>,
    ) -> Self {
        Self {
            tickets,
            assignments,
            activities,
            directory,
        }
    }
}

#[async_trait]
impl<T, A, V, D> TicketQuery for TicketQueryService<T, A, V, D>
where
    T: TicketRepository,
    A: AssignmentRepository,
    V: ActivityRepository,
    D: DirectoryRepository,
{
    async fn get_ticket(&self, actor: &Actor, ticket_id: TicketId) -> Result<TicketDetails, Error> {
        let scope = resolve_scope(self.directory.as_ref(), actor).await?;
        let ticket = find_live_ticket(self.tickets.as_ref(), ticket_id, &scope).await?;

        let agent_ids = self
            .assignments
            .agent_ids(ticket.id)
            .await
            .map_err(map_assignment_error)?;
        let notify_user_ids = self
            .assignments
            .notify_user_ids(ticket.id)
            .await
            .map_err(map_assignment_error)?;
        let labels = self
            .assignments
            .labels(ticket.id)
            .await
            .map_err(map_assignment_error)?;

        Ok(TicketDetails {
            ticket,
            agent_ids,
            notify_user_ids,
            labels,
        })
    }

    async fn list_tickets(
        &self,
        actor: &Actor,
        query: TicketListQuery,
    ) -> Result<Page<Ticket>, Error> {
        let scope = resolve_scope(self.directory.as_ref(), actor).await?;
        if scope.is_nothing() {
            debug!(actor_id = %actor.id(), "actor scope is empty");
            return Ok(Page::empty(query.page));
        }
        self.tickets
            .list(&scope, &query)
            .await
            .map_err(map_ticket_error)
    }

    async fn list_activities(
        &self,
        actor: &Actor,
        ticket_id: TicketId,
        task_id: Option<TaskId>,
        page: PageRequest,
    ) -> Result<Page<Activity>, Error> {
        let scope = resolve_scope(self.directory.as_ref(), actor).await?;
        let ticket = find_visible_ticket(self.tickets.as_ref(), ticket_id, &scope).await?;
        self.activities
            .list(ticket.id, task_id, page)
            .await
            .map_err(map_activity_error)
    }
}

#[cfg(test)]
#[path = "ticket_query_service_tests.rs"]
mod tests;

//! Driving port for scoped ticket reads.

use async_trait::async_trait;
use pagination::{Page, PageRequest};

use crate::domain::{
    Activity, Actor, Error, TaskId, Ticket, TicketDetails, TicketId, TicketListQuery,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TicketQuery: Send + Sync {
    /// A live ticket with its assignment sets. Trashed or out-of-scope
    /// tickets are reported as not found.
    async fn get_ticket(&self, actor: &Actor, ticket_id: TicketId) -> Result<TicketDetails, Error>;

    /// One page of a bucket, restricted to what `actor` may see.
    async fn list_tickets(&self, actor: &Actor, query: TicketListQuery)
    -> Result<Page<Ticket>, Error>;

    /// Activities of a visible ticket (trashed included), newest first.
    async fn list_activities(
        &self,
        actor: &Actor,
        ticket_id: TicketId,
        task_id: Option<TaskId>,
        page: PageRequest,
    ) -> Result<Page<Activity>, Error>;
}

//! Driving port for standalone activity logging.
//!
//! Ticket mutations write their own activities transactionally through the
//! repository ports. This port serves appends that happen outside such a
//! mutation, such as task events, and plain log reads.

use async_trait::async_trait;
use pagination::{Page, PageRequest};
use serde_json::Value;

use crate::domain::{Activity, ActivityKind, Error, TaskId, TicketId, UserId};

/// A standalone activity to append.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordActivityRequest {
    pub ticket_id: TicketId,
    pub task_id: Option<TaskId>,
    pub kind: ActivityKind,
    pub note: String,
    pub actor_id: UserId,
    pub extra: Option<Value>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ActivityLog: Send + Sync {
    /// Append an activity. Never fails the caller: storage errors are logged
    /// and dropped.
    async fn record(&self, request: RecordActivityRequest);

    /// Ticket activities, newest first.
    async fn list_for_ticket(
        &self,
        ticket_id: TicketId,
        page: PageRequest,
    ) -> Result<Page<Activity>, Error>;

    /// Activities of one task on a ticket, newest first.
    async fn list_for_task(
        &self,
        ticket_id: TicketId,
        task_id: TaskId,
        page: PageRequest,
    ) -> Result<Page<Activity>, Error>;
}

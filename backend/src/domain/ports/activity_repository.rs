//! Port for reading and appending ticket activities.

use async_trait::async_trait;
use pagination::{Page, PageRequest};

use crate::domain::{Activity, ActivityEntry, TaskId, TicketId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by activity repository adapters.
    pub enum ActivityRepositoryError {
        Connection { message: String } =>
            "activity repository connection failed: {message}",
        Query { message: String } =>
            "activity repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ActivityRepository: Send + Sync {
    /// Append one activity outside any ticket mutation.
    async fn append(
        &self,
        ticket: TicketId,
        entry: &ActivityEntry,
    ) -> Result<Activity, ActivityRepositoryError>;

    /// Activities of a ticket, newest first (ties broken by id descending).
    /// `task` narrows the page to one task's activities.
    async fn list(
        &self,
        ticket: TicketId,
        task: Option<TaskId>,
        page: PageRequest,
    ) -> Result<Page<Activity>, ActivityRepositoryError>;
}

//! Standalone activity appends and activity reads.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use pagination::{Page, PageRequest};
use tracing::{debug, warn};

use crate::domain::ports::{ActivityLog, ActivityRepository, RecordActivityRequest};
use crate::domain::ticket_service_support::map_activity_error;
use crate::domain::{Activity, ActivityEntry, Error, TaskId, TicketId};

/// Activity log service implementing [`ActivityLog`].
#[derive(Clone)]
pub struct ActivityLogService<V> {
    activities: Arc<V>,
    clock: Arc<dyn Clock>,
}

impl<V> ActivityLogService<V> {
    pub fn new(activities: Arc<V>, clock: Arc<dyn Clock>) -> Self {
        Self { activities, clock }
    }
}

#[async_trait]
impl<V> ActivityLog for ActivityLogService<V>
where
    V: ActivityRepository,
{
    async fn record(&self, request: RecordActivityRequest) {
        let ticket_id = request.ticket_id;
        let entry = ActivityEntry {
            task_id: request.task_id,
            kind: request.kind,
            note: request.note,
            extra: request.extra,
            created_by: request.actor_id,
            created_at: self.clock.utc(),
        };

        match self.activities.append(ticket_id, &entry).await {
            Ok(activity) => debug!(
                ticket_id = %ticket_id,
                activity_id = %activity.id,
                kind = activity.kind.as_str(),
                "activity recorded"
            ),
            Err(err) => warn!(
                ticket_id = %ticket_id,
                kind = entry.kind.as_str(),
                error = %err,
                "dropping activity after storage failure"
            ),
        }
    }

    async fn list_for_ticket(
        &self,
        ticket_id: TicketId,
        page: PageRequest,
    ) -> Result<Page<Activity>, Error> {
        self.activities
            .list(ticket_id, None, page)
            .await
            .map_err(map_activity_error)
    }

    async fn list_for_task(
        &self,
        ticket_id: TicketId,
        task_id: TaskId,
        page: PageRequest,
    ) -> Result<Page<Activity>, Error> {
        self.activities
            .list(ticket_id, Some(task_id), page)
            .await
            .map_err(map_activity_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{ActivityRepositoryError, MockActivityRepository};
    use crate::domain::service_test_helpers::{fixture_clock, fixture_timestamp, ticket_id, user};
    use crate::domain::{ActivityId, ActivityKind, ErrorCode};
    use serde_json::json;

    fn request() -> RecordActivityRequest {
        RecordActivityRequest {
            ticket_id: ticket_id(4),
            task_id: Some(TaskId::new(2).expect("id")),
            kind: ActivityKind::new("Task Completed").expect("kind"),
            note: "Replaced the fuser".to_owned(),
            actor_id: user(3),
            extra: Some(json!({ "minutes": 25 })),
        }
    }

    #[tokio::test]
    async fn record_stamps_the_clock_time() {
        let mut repo = MockActivityRepository::new();
        repo.expect_append()
            .withf(|ticket: &TicketId, entry: &ActivityEntry| {
                *ticket == TicketId::new(4).expect("id")
                    && entry.created_at == fixture_timestamp()
                    && entry.kind.as_str() == "Task Completed"
                    && entry.task_id == Some(TaskId::new(2).expect("id"))
            })
            .times(1)
            .returning(|ticket, entry| {
                Ok(entry
                    .clone()
                    .into_activity(ActivityId::new(1).expect("id"), ticket))
            });

        let service = ActivityLogService::new(Arc::new(repo), fixture_clock());
        service.record(request()).await;
    }

    #[tokio::test]
    async fn record_swallows_storage_errors() {
        let mut repo = MockActivityRepository::new();
        repo.expect_append()
            .times(1)
            .return_once(|_, _| Err(ActivityRepositoryError::connection("offline")));

        let service = ActivityLogService::new(Arc::new(repo), fixture_clock());
        service.record(request()).await;
    }

    #[tokio::test]
    async fn task_reads_narrow_by_task() {
        let mut repo = MockActivityRepository::new();
        repo.expect_list()
            .withf(|_, task: &Option<TaskId>, _| *task == Some(TaskId::new(2).expect("id")))
            .times(1)
            .return_once(|_, _, page| Ok(Page::empty(page)));

        let service = ActivityLogService::new(Arc::new(repo), fixture_clock());
        let page = service
            .list_for_task(ticket_id(4), TaskId::new(2).expect("id"), PageRequest::default())
            .await
            .expect("page");
        assert_eq!(page.total(), 0);
    }

    #[tokio::test]
    async fn ticket_reads_map_query_failures() {
        let mut repo = MockActivityRepository::new();
        repo.expect_list()
            .return_once(|_, _, _| Err(ActivityRepositoryError::query("bad sql")));

        let service = ActivityLogService::new(Arc::new(repo), fixture_clock());
        let err = service
            .list_for_ticket(ticket_id(4), PageRequest::default())
            .await
            .expect_err("query failure");
        assert_eq!(err.code(), ErrorCode::InternalError);
    }
}

//! PostgreSQL-backed `ActivityRepository`.

use async_trait::async_trait;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel_async::RunQueryDsl;
use pagination::{Page, PageRequest};

use crate::domain::ports::{ActivityRepository, ActivityRepositoryError};
use crate::domain::{Activity, ActivityEntry, TaskId, TicketId};

use super::error_mapping::{map_diesel_error, map_invalid_row, map_pool_error};
use super::models::{ActivityRow, NewActivityRow};
use super::pool::{DbPool, PoolError};
use super::schema::activities;

/// Diesel-backed activity log.
#[derive(Clone)]
pub struct DieselActivityRepository {
    pool: DbPool,
}

impl DieselActivityRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool(error: PoolError) -> ActivityRepositoryError {
    map_pool_error(error, ActivityRepositoryError::connection)
}

fn map_diesel(error: DieselError) -> ActivityRepositoryError {
    map_diesel_error(
        error,
        ActivityRepositoryError::query,
        ActivityRepositoryError::connection,
    )
}

fn to_activity(row: ActivityRow) -> Result<Activity, ActivityRepositoryError> {
    Activity::try_from(row).map_err(|error| map_invalid_row(error, ActivityRepositoryError::query))
}

fn for_ticket(ticket: TicketId, task: Option<TaskId>) -> activities::BoxedQuery<'static, Pg> {
    let query = activities::table
        .filter(activities::ticket_id.eq(ticket.get()))
        .into_boxed();
    match task {
        Some(task) => query.filter(activities::task_id.assume_not_null().eq(task.get())),
        None => query,
    }
}

#[async_trait]
impl ActivityRepository for DieselActivityRepository {
    async fn append(
        &self,
        ticket: TicketId,
        entry: &ActivityEntry,
    ) -> Result<Activity, ActivityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        let row: ActivityRow = diesel::insert_into(activities::table)
            .values(NewActivityRow::new(ticket.get(), entry))
            .returning(ActivityRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel)?;
        to_activity(row)
    }

    async fn list(
        &self,
        ticket: TicketId,
        task: Option<TaskId>,
        page: PageRequest,
    ) -> Result<Page<Activity>, ActivityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        let total: i64 = for_ticket(ticket, task)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel)?;
        let rows: Vec<ActivityRow> = for_ticket(ticket, task)
            .select(ActivityRow::as_select())
            .order((activities::created_at.desc(), activities::id.desc()))
            .limit(i64::try_from(page.limit()).unwrap_or(i64::MAX))
            .offset(i64::try_from(page.offset()).unwrap_or(i64::MAX))
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;

        let items = rows
            .into_iter()
            .map(to_activity)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(
            items,
            u64::try_from(total).unwrap_or_default(),
            page,
        ))
    }
}

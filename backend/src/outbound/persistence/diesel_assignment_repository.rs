//! PostgreSQL-backed `AssignmentRepository`.
//!
//! Join-table rows are inserted with `ON CONFLICT DO NOTHING`, so attaching
//! twice reports `false` and logs nothing. The activity for a changed row is
//! written in the same transaction, and a bulk agent sync applies its whole
//! delta in one transaction.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{
    AgentChange, AgentSync, Assignment, AssignmentRepository, AssignmentRepositoryError,
};
use crate::domain::{ActivityEntry, Label, TicketId, UserId};

use super::error_mapping::{map_diesel_error, map_invalid_row, map_pool_error};
use super::models::{LabelRow, NewActivityRow};
use super::pool::{DbPool, PoolError};
use super::schema::{activities, labels, ticket_agents, ticket_labels, ticket_notify_users};

/// Diesel-backed assignment store.
#[derive(Clone)]
pub struct DieselAssignmentRepository {
    pool: DbPool,
}

impl DieselAssignmentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool(error: PoolError) -> AssignmentRepositoryError {
    map_pool_error(error, AssignmentRepositoryError::connection)
}

fn map_diesel(error: DieselError) -> AssignmentRepositoryError {
    map_diesel_error(
        error,
        AssignmentRepositoryError::query,
        AssignmentRepositoryError::connection,
    )
}

fn to_user_ids(raw: Vec<i64>) -> Result<Vec<UserId>, AssignmentRepositoryError> {
    raw.into_iter()
        .map(|id| {
            UserId::new(id).map_err(|error| AssignmentRepositoryError::query(error.to_string()))
        })
        .collect()
}

async fn insert_row(
    conn: &mut AsyncPgConnection,
    ticket: i64,
    assignment: Assignment,
) -> Result<usize, DieselError> {
    match assignment {
        Assignment::Agent(user) => {
            diesel::insert_into(ticket_agents::table)
                .values((
                    ticket_agents::ticket_id.eq(ticket),
                    ticket_agents::user_id.eq(user.get()),
                ))
                .on_conflict_do_nothing()
                .execute(conn)
                .await
        }
        Assignment::NotifyUser(user) => {
            diesel::insert_into(ticket_notify_users::table)
                .values((
                    ticket_notify_users::ticket_id.eq(ticket),
                    ticket_notify_users::user_id.eq(user.get()),
                ))
                .on_conflict_do_nothing()
                .execute(conn)
                .await
        }
        Assignment::Label(label) => {
            diesel::insert_into(ticket_labels::table)
                .values((
                    ticket_labels::ticket_id.eq(ticket),
                    ticket_labels::label_id.eq(label.get()),
                ))
                .on_conflict_do_nothing()
                .execute(conn)
                .await
        }
    }
}

async fn delete_row(
    conn: &mut AsyncPgConnection,
    ticket: i64,
    assignment: Assignment,
) -> Result<usize, DieselError> {
    match assignment {
        Assignment::Agent(user) => {
            diesel::delete(ticket_agents::table.find((ticket, user.get())))
                .execute(conn)
                .await
        }
        Assignment::NotifyUser(user) => {
            diesel::delete(ticket_notify_users::table.find((ticket, user.get())))
                .execute(conn)
                .await
        }
        Assignment::Label(label) => {
            diesel::delete(ticket_labels::table.find((ticket, label.get())))
                .execute(conn)
                .await
        }
    }
}

async fn log_activity(
    conn: &mut AsyncPgConnection,
    ticket: i64,
    activity: &ActivityEntry,
) -> Result<(), DieselError> {
    diesel::insert_into(activities::table)
        .values(NewActivityRow::new(ticket, activity))
        .execute(conn)
        .await?;
    Ok(())
}

impl DieselAssignmentRepository {
    /// Insert (`attach`) or delete one join-table row, logging `activity`
    /// only when a row actually changed.
    async fn apply(
        &self,
        ticket: TicketId,
        assignment: Assignment,
        activity: &ActivityEntry,
        attach: bool,
    ) -> Result<bool, AssignmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        let ticket_id = ticket.get();
        conn.transaction(|conn| {
            async move {
                let changed = if attach {
                    insert_row(conn, ticket_id, assignment).await?
                } else {
                    delete_row(conn, ticket_id, assignment).await?
                };
                if changed == 0 {
                    return Ok(false);
                }
                log_activity(conn, ticket_id, activity).await?;
                Ok(true)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel)
    }
}

#[async_trait]
impl AssignmentRepository for DieselAssignmentRepository {
    async fn agent_ids(&self, ticket: TicketId) -> Result<Vec<UserId>, AssignmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        let ids: Vec<i64> = ticket_agents::table
            .filter(ticket_agents::ticket_id.eq(ticket.get()))
            .select(ticket_agents::user_id)
            .order(ticket_agents::user_id)
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;
        to_user_ids(ids)
    }

    async fn notify_user_ids(
        &self,
        ticket: TicketId,
    ) -> Result<Vec<UserId>, AssignmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        let ids: Vec<i64> = ticket_notify_users::table
            .filter(ticket_notify_users::ticket_id.eq(ticket.get()))
            .select(ticket_notify_users::user_id)
            .order(ticket_notify_users::user_id)
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;
        to_user_ids(ids)
    }

    async fn labels(&self, ticket: TicketId) -> Result<Vec<Label>, AssignmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        let rows: Vec<LabelRow> = ticket_labels::table
            .inner_join(labels::table)
            .filter(ticket_labels::ticket_id.eq(ticket.get()))
            .select(LabelRow::as_select())
            .order(labels::name.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;
        rows.into_iter()
            .map(|row| {
                Label::try_from(row)
                    .map_err(|error| map_invalid_row(error, AssignmentRepositoryError::query))
            })
            .collect()
    }

    async fn attach(
        &self,
        ticket: TicketId,
        assignment: Assignment,
        activity: &ActivityEntry,
    ) -> Result<bool, AssignmentRepositoryError> {
        self.apply(ticket, assignment, activity, true).await
    }

    async fn detach(
        &self,
        ticket: TicketId,
        assignment: Assignment,
        activity: &ActivityEntry,
    ) -> Result<bool, AssignmentRepositoryError> {
        self.apply(ticket, assignment, activity, false).await
    }

    async fn sync_agents(
        &self,
        ticket: TicketId,
        added: &[AgentChange],
        removed: &[AgentChange],
    ) -> Result<AgentSync, AssignmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        let ticket_id = ticket.get();
        conn.transaction(|conn| {
            async move {
                let mut outcome = AgentSync::default();
                for change in added {
                    if insert_row(conn, ticket_id, Assignment::Agent(change.user)).await? > 0 {
                        log_activity(conn, ticket_id, &change.activity).await?;
                        outcome.added.push(change.user);
                    }
                }
                for change in removed {
                    if delete_row(conn, ticket_id, Assignment::Agent(change.user)).await? > 0 {
                        log_activity(conn, ticket_id, &change.activity).await?;
                        outcome.removed.push(change.user);
                    }
                }
                Ok(outcome)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel)
    }
}

//! PostgreSQL-backed `TicketRepository` and `TrackingSequence`.
//!
//! Visibility scopes become SQL predicates (membership subqueries on the
//! agent and notify-user join tables), so listing and lookup never load
//! tickets the actor cannot see. Inserts and updates write the ticket row and
//! its activities in one transaction.

use async_trait::async_trait;
use diesel::dsl::sql;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel::sql_types::Bool;
use diesel_async::AsyncConnection as _;
use diesel_async::RunQueryDsl;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use pagination::Page;

use crate::domain::ports::{
    TicketRepository, TicketRepositoryError, TrackingSequence, TrackingSequenceError,
};
use crate::domain::{
    ActivityEntry, NewTicket, Ticket, TicketBucket, TicketId, TicketListQuery, TicketScope,
    TicketStatus, UserId,
};

use super::error_mapping::{map_diesel_error, map_invalid_row, map_pool_error, unique_violation};
use super::models::{NewActivityRow, NewTicketRow, TicketChangeset, TicketRow};
use super::pool::{DbPool, PoolError};
use super::schema::{activities, ticket_agents, ticket_notify_users, tickets};

/// Unique constraint guarding tracking numbers.
const TRACKING_NUMBER_KEY: &str = "tickets_tracking_number_key";

/// Sequence shared by both ticket types.
const TRACKING_SEQUENCE: &str = "ticket_tracking_number_seq";

diesel::define_sql_function! {
    /// PostgreSQL `nextval(regclass)`, addressed by name.
    fn nextval(sequence: diesel::sql_types::Text) -> diesel::sql_types::Int8;
}

/// Diesel-backed ticket store.
#[derive(Clone)]
pub struct DieselTicketRepository {
    pool: DbPool,
}

impl DieselTicketRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool(error: PoolError) -> TicketRepositoryError {
    map_pool_error(error, TicketRepositoryError::connection)
}

fn map_diesel(error: DieselError) -> TicketRepositoryError {
    map_diesel_error(
        error,
        TicketRepositoryError::query,
        TicketRepositoryError::connection,
    )
}

fn to_ticket(row: TicketRow) -> Result<Ticket, TicketRepositoryError> {
    Ticket::try_from(row).map_err(|error| map_invalid_row(error, TicketRepositoryError::query))
}

/// Escape `LIKE` metacharacters so the term matches literally.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn clamp(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Tickets visible under `scope`, trashed or not.
fn scoped(scope: &TicketScope) -> tickets::BoxedQuery<'static, Pg> {
    let query = tickets::table.into_boxed();
    match scope {
        TicketScope::Unrestricted => query,
        TicketScope::Nothing => query.filter(sql::<Bool>("FALSE")),
        TicketScope::Assigned { user, branch } => {
            let user = user.get();
            let involved = query.filter(
                tickets::id
                    .eq_any(
                        ticket_agents::table
                            .filter(ticket_agents::user_id.eq(user))
                            .select(ticket_agents::ticket_id),
                    )
                    .or(tickets::id.eq_any(
                        ticket_notify_users::table
                            .filter(ticket_notify_users::user_id.eq(user))
                            .select(ticket_notify_users::ticket_id),
                    )),
            );
            match branch {
                Some(branch) => involved.filter(
                    tickets::branch_id
                        .is_null()
                        .or(tickets::branch_id.assume_not_null().eq(branch.get())),
                ),
                None => involved,
            }
        }
        TicketScope::ManagedAgents(agents) => {
            let agents: Vec<i64> = agents.iter().map(|agent| agent.get()).collect();
            query.filter(
                tickets::id.eq_any(
                    ticket_agents::table
                        .filter(ticket_agents::user_id.eq_any(agents))
                        .select(ticket_agents::ticket_id),
                ),
            )
        }
        TicketScope::Branch(branch) => {
            query.filter(tickets::branch_id.assume_not_null().eq(branch.get()))
        }
    }
}

/// Bucket, filters and scope for one listing; unordered and unpaged.
fn listing(scope: &TicketScope, request: &TicketListQuery) -> tickets::BoxedQuery<'static, Pg> {
    let closed = TicketStatus::Closed.code();
    let mut query = match request.bucket {
        TicketBucket::Active => scoped(scope)
            .filter(tickets::deleted_at.is_null())
            .filter(tickets::status.ne(closed)),
        TicketBucket::Closed => scoped(scope)
            .filter(tickets::deleted_at.is_null())
            .filter(tickets::status.eq(closed)),
        TicketBucket::Trashed => scoped(scope).filter(tickets::deleted_at.is_not_null()),
    };

    let filter = &request.filter;
    if let Some(status) = filter.status {
        query = query.filter(tickets::status.eq(status.code()));
    }
    if let Some(priority) = filter.priority_id {
        query = query.filter(tickets::priority_id.assume_not_null().eq(priority.get()));
    }
    if let Some(branch) = filter.branch_id {
        query = query.filter(tickets::branch_id.assume_not_null().eq(branch.get()));
    }
    if let Some(customer) = filter.customer_id {
        query = query.filter(tickets::customer_id.assume_not_null().eq(customer.get()));
    }
    if let Some(term) = filter.search_term() {
        let pattern = like_pattern(term);
        query = query.filter(
            tickets::issue
                .ilike(pattern.clone())
                .or(tickets::tracking_number.ilike(pattern)),
        );
    }
    query
}

#[async_trait]
impl TicketRepository for DieselTicketRepository {
    async fn insert(
        &self,
        ticket: &NewTicket,
        agent_ids: &[UserId],
        entries: &[ActivityEntry],
    ) -> Result<Ticket, TicketRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        let row = conn
            .transaction(|conn| {
                async move {
                    let row: TicketRow = diesel::insert_into(tickets::table)
                        .values(NewTicketRow::from(ticket))
                        .returning(TicketRow::as_returning())
                        .get_result(conn)
                        .await?;

                    if !agent_ids.is_empty() {
                        let agents: Vec<_> = agent_ids
                            .iter()
                            .map(|agent| {
                                (
                                    ticket_agents::ticket_id.eq(row.id),
                                    ticket_agents::user_id.eq(agent.get()),
                                )
                            })
                            .collect();
                        diesel::insert_into(ticket_agents::table)
                            .values(agents)
                            .on_conflict_do_nothing()
                            .execute(conn)
                            .await?;
                    }

                    if !entries.is_empty() {
                        diesel::insert_into(activities::table)
                            .values(NewActivityRow::batch(row.id, entries))
                            .execute(conn)
                            .await?;
                    }
                    Ok::<_, DieselError>(row)
                }
                .scope_boxed()
            })
            .await
            .map_err(|error| {
                if unique_violation(&error, TRACKING_NUMBER_KEY) {
                    TicketRepositoryError::duplicate_tracking_number(
                        ticket.tracking_number.as_str(),
                    )
                } else {
                    map_diesel(error)
                }
            })?;
        to_ticket(row)
    }

    async fn find_scoped(
        &self,
        id: TicketId,
        scope: &TicketScope,
    ) -> Result<Option<Ticket>, TicketRepositoryError> {
        if scope.is_nothing() {
            return Ok(None);
        }
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        let row = scoped(scope)
            .filter(tickets::id.eq(id.get()))
            .select(TicketRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)?;
        row.map(to_ticket).transpose()
    }

    async fn update(
        &self,
        ticket: &Ticket,
        entries: &[ActivityEntry],
    ) -> Result<(), TicketRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        let id = ticket.id.get();
        conn.transaction(|conn| {
            async move {
                let updated = diesel::update(tickets::table.find(id))
                    .set(TicketChangeset::from(ticket))
                    .execute(conn)
                    .await?;
                if updated == 0 {
                    return Err(DieselError::NotFound);
                }
                if !entries.is_empty() {
                    diesel::insert_into(activities::table)
                        .values(NewActivityRow::batch(id, entries))
                        .execute(conn)
                        .await?;
                }
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel)
    }

    async fn list(
        &self,
        scope: &TicketScope,
        query: &TicketListQuery,
    ) -> Result<Page<Ticket>, TicketRepositoryError> {
        if scope.is_nothing() {
            return Ok(Page::empty(query.page));
        }
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        let total: i64 = listing(scope, query)
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel)?;
        let rows: Vec<TicketRow> = listing(scope, query)
            .select(TicketRow::as_select())
            .order((tickets::created_at.desc(), tickets::id.desc()))
            .limit(clamp(query.page.limit()))
            .offset(clamp(query.page.offset()))
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;

        let items = rows
            .into_iter()
            .map(to_ticket)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(
            items,
            u64::try_from(total).unwrap_or_default(),
            query.page,
        ))
    }
}

/// Tracking numbers drawn from the `ticket_tracking_number_seq` sequence.
///
/// `nextval` is never rolled back, so a failed insert leaves a gap rather
/// than a reused number.
#[derive(Clone)]
pub struct DieselTrackingSequence {
    pool: DbPool,
}

impl DieselTrackingSequence {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TrackingSequence for DieselTrackingSequence {
    async fn next_value(&self) -> Result<u64, TrackingSequenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|error| map_pool_error(error, TrackingSequenceError::connection))?;
        let value: i64 = diesel::select(nextval(TRACKING_SEQUENCE))
            .get_result(&mut conn)
            .await
            .map_err(|error| {
                map_diesel_error(
                    error,
                    TrackingSequenceError::query,
                    TrackingSequenceError::connection,
                )
            })?;
        u64::try_from(value).map_err(|_| {
            TrackingSequenceError::query(format!("tracking sequence returned {value}"))
        })
    }
}

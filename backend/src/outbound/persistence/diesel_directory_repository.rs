//! PostgreSQL-backed `DirectoryRepository` over users and reference tables.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel::sql_types::Text;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{DirectoryRepository, DirectoryRepositoryError};
use crate::domain::{BranchId, CustomerId, DirectoryUser, PriorityId, TicketStatus, UserId};

use super::error_mapping::{map_diesel_error, map_invalid_row, map_pool_error};
use super::models::UserRow;
use super::pool::{DbPool, PoolError};
use super::schema::{branches, customers, manager_agents, priorities, statuses, users};

diesel::define_sql_function! {
    fn lower(value: Text) -> Text;
}

/// Diesel-backed user directory.
#[derive(Clone)]
pub struct DieselDirectoryRepository {
    pool: DbPool,
}

impl DieselDirectoryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool(error: PoolError) -> DirectoryRepositoryError {
    map_pool_error(error, DirectoryRepositoryError::connection)
}

fn map_diesel(error: DieselError) -> DirectoryRepositoryError {
    map_diesel_error(
        error,
        DirectoryRepositoryError::query,
        DirectoryRepositoryError::connection,
    )
}

fn to_user(row: UserRow) -> Result<DirectoryUser, DirectoryRepositoryError> {
    DirectoryUser::try_from(row)
        .map_err(|error| map_invalid_row(error, DirectoryRepositoryError::query))
}

#[async_trait]
impl DirectoryRepository for DieselDirectoryRepository {
    async fn find_user(
        &self,
        id: UserId,
    ) -> Result<Option<DirectoryUser>, DirectoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        let row = users::table
            .find(id.get())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)?;
        row.map(to_user).transpose()
    }

    async fn find_users(
        &self,
        ids: &[UserId],
    ) -> Result<Vec<DirectoryUser>, DirectoryRepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let raw: Vec<i64> = ids.iter().map(|id| id.get()).collect();
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        let rows: Vec<UserRow> = users::table
            .filter(users::id.eq_any(raw))
            .select(UserRow::as_select())
            .order(users::id)
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;
        rows.into_iter().map(to_user).collect()
    }

    async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<DirectoryUser>, DirectoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        let row = users::table
            .filter(lower(users::email).eq(email.to_lowercase()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)?;
        row.map(to_user).transpose()
    }

    async fn managed_agent_ids(
        &self,
        manager: UserId,
    ) -> Result<Vec<UserId>, DirectoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        let ids: Vec<i64> = manager_agents::table
            .filter(manager_agents::manager_id.eq(manager.get()))
            .select(manager_agents::agent_id)
            .order(manager_agents::agent_id)
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;
        ids.into_iter()
            .map(|id| {
                UserId::new(id).map_err(|error| DirectoryRepositoryError::query(error.to_string()))
            })
            .collect()
    }

    async fn branch_name(&self, id: BranchId) -> Result<Option<String>, DirectoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        branches::table
            .find(id.get())
            .select(branches::name)
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)
    }

    async fn priority_name(
        &self,
        id: PriorityId,
    ) -> Result<Option<String>, DirectoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        priorities::table
            .find(id.get())
            .select(priorities::name)
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)
    }

    async fn status_name(
        &self,
        status: TicketStatus,
    ) -> Result<Option<String>, DirectoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        statuses::table
            .find(status.code())
            .select(statuses::name)
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)
    }

    async fn customer_name(
        &self,
        id: CustomerId,
    ) -> Result<Option<String>, DirectoryRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        customers::table
            .find(id.get())
            .select(customers::name)
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)
    }
}

//! Port for users and reference tables.
//!
//! Name lookups return `None` when the row does not exist; services use that
//! both for existence checks and for placeholder labels.

use async_trait::async_trait;

use crate::domain::{BranchId, CustomerId, DirectoryUser, PriorityId, TicketStatus, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by directory adapters.
    pub enum DirectoryRepositoryError {
        Connection { message: String } =>
            "directory connection failed: {message}",
        Query { message: String } =>
            "directory query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DirectoryRepository: Send + Sync {
    async fn find_user(
        &self,
        id: UserId,
    ) -> Result<Option<DirectoryUser>, DirectoryRepositoryError>;

    /// Users with the given ids; unknown ids are skipped.
    async fn find_users(
        &self,
        ids: &[UserId],
    ) -> Result<Vec<DirectoryUser>, DirectoryRepositoryError>;

    /// Lookup by lowercased email.
    async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<DirectoryUser>, DirectoryRepositoryError>;

    /// Agents assigned to a manager.
    async fn managed_agent_ids(
        &self,
        manager: UserId,
    ) -> Result<Vec<UserId>, DirectoryRepositoryError>;

    async fn branch_name(&self, id: BranchId) -> Result<Option<String>, DirectoryRepositoryError>;

    async fn priority_name(
        &self,
        id: PriorityId,
    ) -> Result<Option<String>, DirectoryRepositoryError>;

    async fn status_name(
        &self,
        status: TicketStatus,
    ) -> Result<Option<String>, DirectoryRepositoryError>;

    async fn customer_name(
        &self,
        id: CustomerId,
    ) -> Result<Option<String>, DirectoryRepositoryError>;
}

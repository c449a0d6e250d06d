//! Driving ports for session login and actor resolution.
//!
//! Inbound adapters authenticate credentials and turn the session's user id
//! back into an [`Actor`] without touching infrastructure, so handler tests
//! can substitute doubles.

use async_trait::async_trait;

use crate::domain::{Actor, Error, LoginCredentials, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoginService: Send + Sync {
    /// Validate credentials and return the authenticated user id.
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<UserId, Error>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ActorResolver: Send + Sync {
    /// Load the role and branch of a session user; unknown users are
    /// `Unauthorized`.
    async fn resolve(&self, user_id: UserId) -> Result<Actor, Error>;
}

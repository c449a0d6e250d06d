//! Session login and actor resolution backed by the directory.
//!
//! Credential storage is out of scope: every user shares one configured
//! login password. Without a configured password logins are refused.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::domain::ports::{ActorResolver, DirectoryRepository, LoginService};
use crate::domain::ticket_service_support::map_directory_error;
use crate::domain::{Actor, Error, LoginCredentials, UserId};

/// Directory-backed implementation of [`LoginService`] and [`ActorResolver`].
#[derive(Clone)]
pub struct DirectoryService<D> {
    directory: Arc<D>,
    login_password: Option<Arc<Zeroizing<String>>>,
}

impl<D> DirectoryService<D> {
    /// Create the service; `login_password` of `None` disables login.
    pub fn new(directory: Arc<D>, login_password: Option<String>) -> Self {
        Self {
            directory,
            login_password: login_password.map(|password| Arc::new(Zeroizing::new(password))),
        }
    }

    fn password_matches(&self, candidate: &str) -> bool {
        self.login_password
            .as_deref()
            .is_some_and(|expected| expected.as_str() == candidate)
    }
}

#[async_trait]
impl<D> LoginService for DirectoryService<D>
where
    D: DirectoryRepository,
{
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<UserId, Error> {
        let user = self
            .directory
            .find_user_by_email(credentials.email())
            .await
            .map_err(map_directory_error)?;

        match user {
            Some(user) if self.password_matches(credentials.password()) => {
                info!(user_id = %user.id, "user logged in");
                Ok(user.id)
            }
            _ => {
                warn!("rejected login attempt");
                Err(Error::unauthorized("invalid credentials"))
            }
        }
    }
}

#[async_trait]
impl<D> ActorResolver for DirectoryService<D>
where
    D: DirectoryRepository,
{
    async fn resolve(&self, user_id: UserId) -> Result<Actor, Error> {
        self.directory
            .find_user(user_id)
            .await
            .map_err(map_directory_error)?
            .map(|user| user.actor())
            .ok_or_else(|| Error::unauthorized("login required"))
    }
}

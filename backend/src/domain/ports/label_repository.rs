//! Port for the label catalogue.

use async_trait::async_trait;

use crate::domain::{Label, LabelId, NewLabel};

use super::define_port_error;

define_port_error! {
    /// Errors raised by label repository adapters.
    pub enum LabelRepositoryError {
        Connection { message: String } =>
            "label repository connection failed: {message}",
        Query { message: String } =>
            "label repository query failed: {message}",
        /// The unique name constraint rejected an insert.
        DuplicateName { name: String } =>
            "label {name} already exists",
    }
}

/// Result of a delete attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelDeletion {
    Deleted,
    /// At least one ticket still references the label.
    InUse,
    Missing,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LabelRepository: Send + Sync {
    /// All labels ordered by name.
    async fn list(&self) -> Result<Vec<Label>, LabelRepositoryError>;

    async fn find(&self, id: LabelId) -> Result<Option<Label>, LabelRepositoryError>;

    async fn insert(&self, label: &NewLabel) -> Result<Label, LabelRepositoryError>;

    /// Delete an unreferenced label.
    async fn delete(&self, id: LabelId) -> Result<LabelDeletion, LabelRepositoryError>;
}

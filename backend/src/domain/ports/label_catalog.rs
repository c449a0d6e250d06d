//! Driving port for label management.

use async_trait::async_trait;

use crate::domain::{Error, Label, LabelId};

/// Raw label input; the service validates both fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLabelRequest {
    pub name: String,
    pub color: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LabelCatalog: Send + Sync {
    async fn list_labels(&self) -> Result<Vec<Label>, Error>;

    /// Create a label; a taken name is a field validation failure.
    async fn create_label(&self, request: NewLabelRequest) -> Result<Label, Error>;

    /// Delete a label no ticket references, else `Conflict`.
    async fn delete_label(&self, id: LabelId) -> Result<(), Error>;
}

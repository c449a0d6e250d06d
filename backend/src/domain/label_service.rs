//! Label catalogue service.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::domain::ports::{
    LabelCatalog, LabelDeletion, LabelRepository, LabelRepositoryError, NewLabelRequest,
};
use crate::domain::ticket_service_support::map_label_error;
use crate::domain::{Error, FieldErrors, Label, LabelColor, LabelId, LabelName, NewLabel};

/// Label service implementing [`LabelCatalog`].
#[derive(Clone)]
pub struct LabelService<L> {
    labels: Arc<L>,
}

impl<L> LabelService<L> {
    pub fn new(labels: Arc<L>) -> Self {
        Self { labels }
    }
}

#[async_trait]
impl<L> LabelCatalog for LabelService<L>
where
    L: LabelRepository,
{
    async fn list_labels(&self) -> Result<Vec<Label>, Error> {
        self.labels.list().await.map_err(map_label_error)
    }

    async fn create_label(&self, request: NewLabelRequest) -> Result<Label, Error> {
        let mut errors = FieldErrors::new();
        let name = errors.check("name", LabelName::new(request.name));
        let color = errors.check("color", LabelColor::new(request.color));
        let (Some(name), Some(color)) = (name, color) else {
            return Err(errors.into_error());
        };

        match self.labels.insert(&NewLabel { name, color }).await {
            Ok(label) => {
                info!(label_id = %label.id, name = label.name.as_str(), "label created");
                Ok(label)
            }
            Err(LabelRepositoryError::DuplicateName { name }) => Err(FieldErrors::single(
                "name",
                format!("a label named {name} already exists"),
            )),
            Err(err) => Err(map_label_error(err)),
        }
    }

    async fn delete_label(&self, id: LabelId) -> Result<(), Error> {
        match self.labels.delete(id).await.map_err(map_label_error)? {
            LabelDeletion::Deleted => {
                info!(label_id = %id, "label deleted");
                Ok(())
            }
            LabelDeletion::InUse => Err(Error::conflict(format!(
                "label {id} is still attached to tickets"
            ))),
            LabelDeletion::Missing => Err(Error::not_found(format!("label {id} not found"))),
        }
    }
}

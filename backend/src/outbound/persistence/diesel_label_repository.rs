//! PostgreSQL-backed `LabelRepository`.
//!
//! Deletion checks for attachments inside the same transaction as the
//! delete; the `ON DELETE RESTRICT` foreign key on `ticket_labels` backs the
//! check up against a concurrent attach.

use async_trait::async_trait;
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, RunQueryDsl};

use crate::domain::ports::{LabelDeletion, LabelRepository, LabelRepositoryError};
use crate::domain::{Label, LabelId, NewLabel};

use super::error_mapping::{map_diesel_error, map_invalid_row, map_pool_error, unique_violation};
use super::models::{LabelRow, NewLabelRow};
use super::pool::{DbPool, PoolError};
use super::schema::{labels, ticket_labels};

const LABEL_NAME_KEY: &str = "labels_name_key";

/// Diesel-backed label catalogue.
#[derive(Clone)]
pub struct DieselLabelRepository {
    pool: DbPool,
}

impl DieselLabelRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool(error: PoolError) -> LabelRepositoryError {
    map_pool_error(error, LabelRepositoryError::connection)
}

fn map_diesel(error: DieselError) -> LabelRepositoryError {
    map_diesel_error(
        error,
        LabelRepositoryError::query,
        LabelRepositoryError::connection,
    )
}

fn to_label(row: LabelRow) -> Result<Label, LabelRepositoryError> {
    Label::try_from(row).map_err(|error| map_invalid_row(error, LabelRepositoryError::query))
}

#[async_trait]
impl LabelRepository for DieselLabelRepository {
    async fn list(&self) -> Result<Vec<Label>, LabelRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        let rows: Vec<LabelRow> = labels::table
            .select(LabelRow::as_select())
            .order((labels::name.asc(), labels::id.asc()))
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;
        rows.into_iter().map(to_label).collect()
    }

    async fn find(&self, id: LabelId) -> Result<Option<Label>, LabelRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        let row = labels::table
            .find(id.get())
            .select(LabelRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)?;
        row.map(to_label).transpose()
    }

    async fn insert(&self, label: &NewLabel) -> Result<Label, LabelRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        let row: LabelRow = diesel::insert_into(labels::table)
            .values(NewLabelRow::from(label))
            .returning(LabelRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|error| {
                if unique_violation(&error, LABEL_NAME_KEY) {
                    LabelRepositoryError::duplicate_name(label.name.as_str())
                } else {
                    map_diesel(error)
                }
            })?;
        to_label(row)
    }

    async fn delete(&self, id: LabelId) -> Result<LabelDeletion, LabelRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        let label_id = id.get();
        let outcome = conn
            .transaction(|conn| {
                async move {
                    let in_use: bool = diesel::select(exists(
                        ticket_labels::table.filter(ticket_labels::label_id.eq(label_id)),
                    ))
                    .get_result(conn)
                    .await?;
                    if in_use {
                        let known: bool =
                            diesel::select(exists(labels::table.find(label_id)))
                                .get_result(conn)
                                .await?;
                        return Ok(if known {
                            LabelDeletion::InUse
                        } else {
                            LabelDeletion::Missing
                        });
                    }
                    let deleted = diesel::delete(labels::table.find(label_id))
                        .execute(conn)
                        .await?;
                    Ok::<_, DieselError>(if deleted == 0 {
                        LabelDeletion::Missing
                    } else {
                        LabelDeletion::Deleted
                    })
                }
                .scope_boxed()
            })
            .await;

        match outcome {
            Err(DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _)) => {
                Ok(LabelDeletion::InUse)
            }
            other => other.map_err(map_diesel),
        }
    }
}

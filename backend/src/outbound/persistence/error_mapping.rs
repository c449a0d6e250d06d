//! Diesel and pool error mapping shared by every repository.
//!
//! Each port error enum has `connection` and `query` constructors; repositories
//! pass those constructors in and add their own unique-violation handling on
//! top via [`unique_violation`].

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use super::models::InvalidRow;
use super::pool::PoolError;

/// Map a checkout or build failure onto a port's connection error.
pub(crate) fn map_pool_error<E>(error: PoolError, connection: impl FnOnce(String) -> E) -> E {
    connection(error.into_message())
}

/// Map a Diesel failure onto a port's query or connection error.
///
/// Closed connections are connection errors; everything else is a query
/// error. The driver message is logged at debug level and kept out of the
/// returned error.
pub(crate) fn map_diesel_error<E>(
    error: DieselError,
    query: impl FnOnce(&'static str) -> E,
    connection: impl FnOnce(&'static str) -> E,
) -> E {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        other => debug!(error = %other, "diesel operation failed"),
    }

    match error {
        DieselError::NotFound => query("record not found"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            connection("database connection error")
        }
        DieselError::QueryBuilderError(_) => query("database query error"),
        _ => query("database error"),
    }
}

/// Whether `error` is a unique violation on `constraint`.
pub(crate) fn unique_violation(error: &DieselError, constraint: &str) -> bool {
    matches!(
        error,
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info)
            if info.constraint_name() == Some(constraint)
    )
}

/// Map a row the domain rejects onto a port's query error.
pub(crate) fn map_invalid_row<E>(error: InvalidRow, query: impl FnOnce(String) -> E) -> E {
    debug!(%error, "stored row failed validation");
    query(error.to_string())
}

//! Shared helpers for the Diesel repository suites.
//!
//! Integration tests compile as separate crates under `backend/tests/`, so
//! each suite pulls this module in with `mod support;` and uses the subset it
//! needs.
#![allow(dead_code, reason = "each suite uses a different subset of helpers")]

pub mod cluster_skip;
pub mod embedded_postgres;
pub mod pg_embed;

pub use cluster_skip::handle_cluster_setup_failure;
pub use embedded_postgres::{DbContext, setup_database};

/// Render a `postgres` error with its SQLSTATE and message.
///
/// `postgres::Error`'s `Display` collapses database errors to `db error`, so
/// prefer the structured fields when they exist.
pub fn format_postgres_error(error: &postgres::Error) -> String {
    let Some(db_error) = error.as_db_error() else {
        return error.to_string();
    };

    let mut summary = format!(
        "postgres error {:?}: {}",
        db_error.code(),
        db_error.message()
    );
    if let Some(detail) = db_error.detail() {
        summary.push_str("; detail: ");
        summary.push_str(detail);
    }
    summary
}

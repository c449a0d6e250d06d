//! Outbound adapters implementing the driven ports.
//!
//! - **persistence**: PostgreSQL repositories using Diesel ORM.
//! - **memory**: a process-local store for runs without a database and for
//!   tests.
//!
//! Adapters translate between domain types and storage representations and
//! contain no business rules.

pub mod memory;
pub mod persistence;

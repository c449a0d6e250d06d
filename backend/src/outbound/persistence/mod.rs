//! PostgreSQL adapters built on Diesel.
//!
//! Each repository is a thin translation between Diesel row structs and
//! domain types; no business rules live here. Row structs (`models.rs`) and
//! table definitions (`schema.rs`) never leave this module. Connections come
//! from a shared bb8 pool through `diesel-async`.
//!
//! ```no_run
//! use helpdesk::outbound::persistence::{DbPool, DieselTicketRepository, PoolConfig};
//!
//! # async fn wire() -> Result<(), helpdesk::outbound::persistence::PoolError> {
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/helpdesk")).await?;
//! let tickets = DieselTicketRepository::new(pool);
//! # let _ = tickets;
//! # Ok(())
//! # }
//! ```

mod diesel_activity_repository;
mod diesel_assignment_repository;
mod diesel_directory_repository;
mod diesel_label_repository;
mod diesel_ticket_repository;
mod error_mapping;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_activity_repository::DieselActivityRepository;
pub use diesel_assignment_repository::DieselAssignmentRepository;
pub use diesel_directory_repository::DieselDirectoryRepository;
pub use diesel_label_repository::DieselLabelRepository;
pub use diesel_ticket_repository::{DieselTicketRepository, DieselTrackingSequence};
pub use migrations::{MigrationError, run_migrations};
pub use pool::{DEFAULT_MAX_CONNECTIONS, DbPool, PoolConfig, PoolError};

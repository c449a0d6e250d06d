//! Helpdesk ticket lifecycle backend.
//!
//! The crate follows a hexagonal layout: [`domain`] holds the model, services
//! and ports; [`inbound`] adapts HTTP requests onto the driving ports;
//! [`outbound`] implements the driven ports for PostgreSQL and for memory.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
#[cfg(feature = "test-support")]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;

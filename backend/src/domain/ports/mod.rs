//! Domain ports for the hexagonal boundary.
//!
//! Driven ports (`*Repository`, [`TrackingSequence`]) are implemented by the
//! outbound adapters. Driving ports ([`TicketCommand`], [`TicketQuery`],
//! [`AssignmentCommand`], [`ActivityLog`], [`LabelCatalog`],
//! [`LoginService`], [`ActorResolver`]) are implemented by domain services
//! and called from inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod activity_log;
mod activity_repository;
mod assignment_command;
mod assignment_repository;
mod directory_repository;
mod label_catalog;
mod label_repository;
mod login_service;
mod ticket_command;
mod ticket_query;
mod ticket_repository;
mod tracking_sequence;

#[cfg(test)]
pub use activity_log::MockActivityLog;
pub use activity_log::{ActivityLog, RecordActivityRequest};
#[cfg(test)]
pub use activity_repository::MockActivityRepository;
pub use activity_repository::{ActivityRepository, ActivityRepositoryError};
#[cfg(test)]
pub use assignment_command::MockAssignmentCommand;
pub use assignment_command::{AgentSync, AssignmentCommand};
#[cfg(test)]
pub use assignment_repository::MockAssignmentRepository;
pub use assignment_repository::{
    AgentChange, Assignment, AssignmentRepository, AssignmentRepositoryError,
};
#[cfg(test)]
pub use directory_repository::MockDirectoryRepository;
pub use directory_repository::{DirectoryRepository, DirectoryRepositoryError};
#[cfg(test)]
pub use label_catalog::MockLabelCatalog;
pub use label_catalog::{LabelCatalog, NewLabelRequest};
#[cfg(test)]
pub use label_repository::MockLabelRepository;
pub use label_repository::{LabelDeletion, LabelRepository, LabelRepositoryError};
pub use login_service::{ActorResolver, LoginService};
#[cfg(test)]
pub use login_service::{MockActorResolver, MockLoginService};
#[cfg(test)]
pub use ticket_command::MockTicketCommand;
pub use ticket_command::{NewTicketRequest, TicketCommand};
#[cfg(test)]
pub use ticket_query::MockTicketQuery;
pub use ticket_query::TicketQuery;
#[cfg(test)]
pub use ticket_repository::MockTicketRepository;
pub use ticket_repository::{TicketRepository, TicketRepositoryError};
#[cfg(test)]
pub use tracking_sequence::MockTrackingSequence;
pub use tracking_sequence::{TrackingSequence, TrackingSequenceError};

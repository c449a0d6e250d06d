//! Users and reference data the ticket services read but never write.

use crate::domain::{Actor, BranchId, Role, UserId};

/// Placeholder label for an absent reference value.
pub const NONE_LABEL: &str = "None";

/// A helpdesk user as seen by the ticket services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub branch_id: Option<BranchId>,
}

impl DirectoryUser {
    /// The acting identity for requests made by this user.
    pub fn actor(&self) -> Actor {
        Actor::new(self.id, self.role, self.branch_id)
    }
}

/// Label for an optional reference id, falling back to `"#<id>"` when the
/// reference row is missing and [`NONE_LABEL`] when the value is absent.
pub(crate) fn reference_label<I: std::fmt::Display>(id: Option<I>, name: Option<String>) -> String {
    match (id, name) {
        (None, _) => NONE_LABEL.to_owned(),
        (Some(_), Some(name)) => name,
        (Some(id), None) => format!("#{id}"),
    }
}

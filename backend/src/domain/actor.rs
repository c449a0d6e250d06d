//! The acting identity passed into every ticket operation.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{BranchId, UserId};

/// Rejected role code read from storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown role code {0}")]
pub struct UnknownRoleError(pub i16);

/// Helpdesk role, stored as a small integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Agent,
    Manager,
    BranchAdmin,
}

impl Role {
    /// Storage code for this role.
    pub const fn code(self) -> i16 {
        match self {
            Self::Admin => 1,
            Self::Agent => 2,
            Self::Manager => 3,
            Self::BranchAdmin => 4,
        }
    }

    /// Parse a storage code.
    pub const fn from_code(code: i16) -> Result<Self, UnknownRoleError> {
        match code {
            1 => Ok(Self::Admin),
            2 => Ok(Self::Agent),
            3 => Ok(Self::Manager),
            4 => Ok(Self::BranchAdmin),
            other => Err(UnknownRoleError(other)),
        }
    }

    /// Whether this role may delete or restore tickets it did not create.
    pub const fn can_trash_any_ticket(self) -> bool {
        match self {
            Self::Admin | Self::Manager => true,
            Self::Agent | Self::BranchAdmin => false,
        }
    }
}

/// Authenticated user performing an operation.
///
/// # Examples
/// ```
/// use helpdesk::domain::{Actor, BranchId, Role, UserId};
///
/// let actor = Actor::new(
///     UserId::new(7).expect("id"),
///     Role::Agent,
///     Some(BranchId::new(2).expect("id")),
/// );
/// assert_eq!(actor.role(), Role::Agent);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    id: UserId,
    role: Role,
    branch_id: Option<BranchId>,
}

impl Actor {
    pub const fn new(id: UserId, role: Role, branch_id: Option<BranchId>) -> Self {
        Self {
            id,
            role,
            branch_id,
        }
    }

    pub const fn id(&self) -> UserId {
        self.id
    }

    pub const fn role(&self) -> Role {
        self.role
    }

    pub const fn branch_id(&self) -> Option<BranchId> {
        self.branch_id
    }
}

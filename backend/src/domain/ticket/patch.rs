//! Sparse ticket updates and the field changes they produce.

use chrono::{DateTime, Utc};

use super::{Ticket, TicketStatus};
use crate::domain::{BranchId, CustomerId, PriorityId};

/// Tri-state update for a nullable field.
///
/// `Keep` leaves the value alone, `Clear` nulls it, `Set` replaces it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate<T> {
    Keep,
    Clear,
    Set(T),
}

impl<T> Default for FieldUpdate<T> {
    fn default() -> Self {
        Self::Keep
    }
}

impl<T> FieldUpdate<T> {
    /// Interpret a doubly optional wire value: absent, `null`, or a value.
    pub fn from_nullable(value: Option<Option<T>>) -> Self {
        match value {
            None => Self::Keep,
            Some(None) => Self::Clear,
            Some(Some(value)) => Self::Set(value),
        }
    }

    pub fn is_keep(&self) -> bool {
        matches!(self, Self::Keep)
    }

    /// Fallibly convert the carried value.
    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<FieldUpdate<U>, E> {
        Ok(match self {
            Self::Keep => FieldUpdate::Keep,
            Self::Clear => FieldUpdate::Clear,
            Self::Set(value) => FieldUpdate::Set(f(value)?),
        })
    }

    /// The value to set, if any.
    pub fn as_set(&self) -> Option<&T> {
        match self {
            Self::Set(value) => Some(value),
            Self::Keep | Self::Clear => None,
        }
    }
}

impl<T: Clone> FieldUpdate<T> {
    /// Resolve against the current value.
    pub fn resolve(&self, current: &Option<T>) -> Option<T> {
        match self {
            Self::Keep => current.clone(),
            Self::Clear => None,
            Self::Set(value) => Some(value.clone()),
        }
    }
}

/// Sparse update of a ticket's editable fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketPatch {
    pub status: Option<TicketStatus>,
    pub priority_id: FieldUpdate<PriorityId>,
    pub branch_id: FieldUpdate<BranchId>,
    pub due_date: FieldUpdate<DateTime<Utc>>,
    pub closed_time: FieldUpdate<DateTime<Utc>>,
    pub customer_id: FieldUpdate<CustomerId>,
    pub issue: Option<String>,
    pub description: FieldUpdate<String>,
}

impl TicketPatch {
    /// Whether the patch names no field at all.
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.priority_id.is_keep()
            && self.branch_id.is_keep()
            && self.due_date.is_keep()
            && self.closed_time.is_keep()
            && self.customer_id.is_keep()
            && self.issue.is_none()
            && self.description.is_keep()
    }
}

/// One effective field change, recorded in the activity log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketChange {
    Status {
        from: TicketStatus,
        to: TicketStatus,
    },
    Priority {
        from: Option<PriorityId>,
        to: Option<PriorityId>,
    },
    Branch {
        from: Option<BranchId>,
        to: Option<BranchId>,
    },
    DueDate {
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    },
    ClosedTime {
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    },
    Customer {
        from: Option<CustomerId>,
        to: Option<CustomerId>,
    },
    Details,
}

impl Ticket {
    /// Apply `patch`, returning the changes in a stable field order.
    ///
    /// Moving into `Closed` stamps `closed_at` with `now` unless the patch
    /// also carries an explicit `closed_time`. The implicit stamp is part of
    /// the status change and is not reported separately. `updated_at` moves
    /// only when something changed.
    pub fn apply_patch(&mut self, patch: &TicketPatch, now: DateTime<Utc>) -> Vec<TicketChange> {
        let mut changes = Vec::new();
        let original_closed_at = self.closed_at;

        if let Some(status) = patch.status.filter(|status| *status != self.status) {
            changes.push(TicketChange::Status {
                from: self.status,
                to: status,
            });
            if status == TicketStatus::Closed {
                self.closed_at = Some(now);
            }
            self.status = status;
        }

        let priority = patch.priority_id.resolve(&self.priority_id);
        if priority != self.priority_id {
            changes.push(TicketChange::Priority {
                from: self.priority_id,
                to: priority,
            });
            self.priority_id = priority;
        }

        let branch = patch.branch_id.resolve(&self.branch_id);
        if branch != self.branch_id {
            changes.push(TicketChange::Branch {
                from: self.branch_id,
                to: branch,
            });
            self.branch_id = branch;
        }

        let due_date = patch.due_date.resolve(&self.due_date);
        if due_date != self.due_date {
            changes.push(TicketChange::DueDate {
                from: self.due_date,
                to: due_date,
            });
            self.due_date = due_date;
        }

        if !patch.closed_time.is_keep() {
            let closed_time = patch.closed_time.resolve(&original_closed_at);
            if closed_time != original_closed_at {
                changes.push(TicketChange::ClosedTime {
                    from: original_closed_at,
                    to: closed_time,
                });
            }
            self.closed_at = closed_time;
        }

        let customer = patch.customer_id.resolve(&self.customer_id);
        if customer != self.customer_id {
            changes.push(TicketChange::Customer {
                from: self.customer_id,
                to: customer,
            });
            self.customer_id = customer;
        }

        let issue = patch.issue.clone().unwrap_or_else(|| self.issue.clone());
        let description = patch.description.resolve(&self.description);
        if issue != self.issue || description != self.description {
            changes.push(TicketChange::Details);
            self.issue = issue;
            self.description = description;
        }

        if !changes.is_empty() {
            self.updated_at = now;
        }
        changes
    }
}

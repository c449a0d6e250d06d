//! Ticket listing buckets and filters.

use pagination::PageRequest;

use crate::domain::{BranchId, CustomerId, PriorityId, Ticket, TicketStatus};

/// Which of the three ticket lists to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TicketBucket {
    /// Not deleted and not closed.
    #[default]
    Active,
    /// Not deleted and closed.
    Closed,
    /// Soft-deleted, whatever the status.
    Trashed,
}

impl TicketBucket {
    pub fn contains(self, ticket: &Ticket) -> bool {
        match self {
            Self::Active => !ticket.is_trashed() && ticket.status != TicketStatus::Closed,
            Self::Closed => !ticket.is_trashed() && ticket.status == TicketStatus::Closed,
            Self::Trashed => ticket.is_trashed(),
        }
    }
}

/// Optional narrowing applied on top of the bucket and the actor's scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketFilter {
    pub status: Option<TicketStatus>,
    pub priority_id: Option<PriorityId>,
    pub branch_id: Option<BranchId>,
    pub customer_id: Option<CustomerId>,
    /// Case-insensitive substring of the issue or tracking number.
    pub search: Option<String>,
}

impl TicketFilter {
    /// Trimmed, non-empty search term.
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }

    pub fn matches(&self, ticket: &Ticket) -> bool {
        fn wanted<T: PartialEq>(filter: Option<T>, value: Option<T>) -> bool {
            filter.is_none_or(|expected| value == Some(expected))
        }

        let searched = self.search_term().is_none_or(|term| {
            let term = term.to_lowercase();
            ticket.issue.to_lowercase().contains(&term)
                || ticket.tracking_number.as_str().to_lowercase().contains(&term)
        });

        wanted(self.status, Some(ticket.status))
            && wanted(self.priority_id, ticket.priority_id)
            && wanted(self.branch_id, ticket.branch_id)
            && wanted(self.customer_id, ticket.customer_id)
            && searched
    }
}

/// A page request for one bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketListQuery {
    pub bucket: TicketBucket,
    pub filter: TicketFilter,
    pub page: PageRequest,
}

/// Newest first: `created_at` descending, then id descending.
pub(crate) fn newest_first(a: &Ticket, b: &Ticket) -> std::cmp::Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| b.id.cmp(&a.id))
}

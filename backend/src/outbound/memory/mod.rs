//! In-memory adapter implementing every driven port.
//!
//! Backs local runs without PostgreSQL and the integration tests. All state
//! sits behind one [`Mutex`], so each port call observes and mutates a
//! consistent snapshot, mirroring the transaction boundaries of the Diesel
//! adapter. Tracking numbers come from a separate atomic counter that is
//! never rewound.
//!
//! ```
//! use helpdesk::outbound::memory::InMemoryStore;
//!
//! let store = InMemoryStore::with_demo_data();
//! assert_eq!(store.tracking_value(), 0);
//! ```

mod demo;
mod repositories;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::domain::ports::Assignment;
use crate::domain::{
    Activity, ActivityEntry, ActivityId, BranchId, CustomerId, DirectoryUser, Label, LabelId,
    PriorityId, ScopeFacts, Ticket, TicketId, TicketScope, TicketStatus, UserId,
};

const POISONED: &str = "in-memory store lock poisoned";

/// Tables of the helpdesk schema held in process memory.
#[derive(Debug, Default)]
struct State {
    users: BTreeMap<UserId, DirectoryUser>,
    branches: BTreeMap<BranchId, String>,
    priorities: BTreeMap<PriorityId, String>,
    statuses: HashMap<TicketStatus, String>,
    customers: BTreeMap<CustomerId, String>,
    manager_agents: BTreeSet<(UserId, UserId)>,
    tickets: BTreeMap<TicketId, Ticket>,
    ticket_agents: BTreeSet<(TicketId, UserId)>,
    ticket_notify_users: BTreeSet<(TicketId, UserId)>,
    ticket_labels: BTreeSet<(TicketId, LabelId)>,
    labels: BTreeMap<LabelId, Label>,
    activities: Vec<Activity>,
    last_ticket_id: i64,
    last_label_id: i64,
    last_activity_id: i64,
}

impl State {
    fn members(set: &BTreeSet<(TicketId, UserId)>, ticket: TicketId) -> Vec<UserId> {
        set.iter()
            .filter(|(owner, _)| *owner == ticket)
            .map(|(_, user)| *user)
            .collect()
    }

    fn agent_ids(&self, ticket: TicketId) -> Vec<UserId> {
        Self::members(&self.ticket_agents, ticket)
    }

    fn notify_user_ids(&self, ticket: TicketId) -> Vec<UserId> {
        Self::members(&self.ticket_notify_users, ticket)
    }

    fn label_ids(&self, ticket: TicketId) -> Vec<LabelId> {
        self.ticket_labels
            .iter()
            .filter(|(owner, _)| *owner == ticket)
            .map(|(_, label)| *label)
            .collect()
    }

    fn is_visible(&self, ticket: &Ticket, scope: &TicketScope) -> bool {
        let agents = self.agent_ids(ticket.id);
        let notify = self.notify_user_ids(ticket.id);
        scope.permits(ScopeFacts {
            branch_id: ticket.branch_id,
            agent_ids: &agents,
            notify_user_ids: &notify,
        })
    }

    fn next_ticket_id(&mut self) -> Option<TicketId> {
        self.last_ticket_id = self.last_ticket_id.checked_add(1)?;
        TicketId::new(self.last_ticket_id).ok()
    }

    fn next_label_id(&mut self) -> Option<LabelId> {
        self.last_label_id = self.last_label_id.checked_add(1)?;
        LabelId::new(self.last_label_id).ok()
    }

    fn append_activity(&mut self, ticket: TicketId, entry: &ActivityEntry) -> Option<Activity> {
        self.last_activity_id = self.last_activity_id.checked_add(1)?;
        let id = ActivityId::new(self.last_activity_id).ok()?;
        let activity = entry.clone().into_activity(id, ticket);
        self.activities.push(activity.clone());
        Some(activity)
    }

    fn assignment_rows(&mut self, ticket: TicketId, assignment: Assignment) -> AssignmentRow<'_> {
        match assignment {
            Assignment::Agent(user) => AssignmentRow::User(&mut self.ticket_agents, (ticket, user)),
            Assignment::NotifyUser(user) => {
                AssignmentRow::User(&mut self.ticket_notify_users, (ticket, user))
            }
            Assignment::Label(label) => {
                AssignmentRow::Label(&mut self.ticket_labels, (ticket, label))
            }
        }
    }
}

/// One join-table row addressed by an [`Assignment`].
enum AssignmentRow<'a> {
    User(&'a mut BTreeSet<(TicketId, UserId)>, (TicketId, UserId)),
    Label(&'a mut BTreeSet<(TicketId, LabelId)>, (TicketId, LabelId)),
}

impl AssignmentRow<'_> {
    fn insert(self) -> bool {
        match self {
            Self::User(set, row) => set.insert(row),
            Self::Label(set, row) => set.insert(row),
        }
    }

    fn remove(self) -> bool {
        match self {
            Self::User(set, row) => set.remove(&row),
            Self::Label(set, row) => set.remove(&row),
        }
    }
}

/// Process-local store implementing the repository ports and the tracking
/// sequence.
///
/// Share it behind an `Arc`; every service takes its ports as `Arc<T>`.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
    tracking: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last value handed out by the tracking sequence.
    pub fn tracking_value(&self) -> u64 {
        self.tracking.load(Ordering::SeqCst)
    }

    /// Start the tracking sequence after `value`.
    #[must_use]
    pub fn with_tracking_value(self, value: u64) -> Self {
        self.tracking.store(value, Ordering::SeqCst);
        self
    }

    #[must_use]
    pub fn with_user(mut self, user: DirectoryUser) -> Self {
        self.state_mut().users.insert(user.id, user);
        self
    }

    #[must_use]
    pub fn with_branch(mut self, id: BranchId, name: impl Into<String>) -> Self {
        self.state_mut().branches.insert(id, name.into());
        self
    }

    #[must_use]
    pub fn with_priority(mut self, id: PriorityId, name: impl Into<String>) -> Self {
        self.state_mut().priorities.insert(id, name.into());
        self
    }

    /// Name a status row; unnamed statuses fall back to their enum label.
    #[must_use]
    pub fn with_status_name(mut self, status: TicketStatus, name: impl Into<String>) -> Self {
        self.state_mut().statuses.insert(status, name.into());
        self
    }

    #[must_use]
    pub fn with_customer(mut self, id: CustomerId, name: impl Into<String>) -> Self {
        self.state_mut().customers.insert(id, name.into());
        self
    }

    /// Put `agent` under `manager`.
    #[must_use]
    pub fn with_managed_agent(mut self, manager: UserId, agent: UserId) -> Self {
        self.state_mut().manager_agents.insert((manager, agent));
        self
    }

    /// Seed a label with a caller-chosen id.
    #[must_use]
    pub fn with_label(mut self, label: Label) -> Self {
        let state = self.state_mut();
        state.last_label_id = state.last_label_id.max(label.id.get());
        state.labels.insert(label.id, label);
        self
    }

    fn state_mut(&mut self) -> &mut State {
        self.state.get_mut().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock<E>(
        &self,
        connection: impl FnOnce(&'static str) -> E,
    ) -> Result<MutexGuard<'_, State>, E> {
        self.state.lock().map_err(|_| connection(POISONED))
    }
}

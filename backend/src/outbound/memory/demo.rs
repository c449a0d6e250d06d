//! Demo directory used when the server runs without a database.
//!
//! Every demo user logs in with the configured shared password.

use crate::domain::{
    BranchId, CustomerId, DirectoryUser, Label, LabelColor, LabelId, LabelName, PriorityId, Role,
    TicketStatus, UserId,
};

use super::InMemoryStore;

/// `(id, name, email, role, branch)`
const USERS: [(i64, &str, &str, Role, Option<i64>); 6] = [
    (1, "Ada Admin", "admin@example.com", Role::Admin, None),
    (2, "Alan Agent", "agent@example.com", Role::Agent, Some(1)),
    (3, "Grace Manager", "manager@example.com", Role::Manager, None),
    (4, "Barbara Branch", "branch@example.com", Role::BranchAdmin, Some(1)),
    (5, "Edsger Agent", "harbour.agent@example.com", Role::Agent, Some(2)),
    (6, "Idle Manager", "idle.manager@example.com", Role::Manager, None),
];

const BRANCHES: [(i64, &str); 2] = [(1, "Downtown"), (2, "Harbour")];

const PRIORITIES: [(i64, &str); 4] = [(1, "Low"), (2, "Medium"), (3, "High"), (4, "Urgent")];

const CUSTOMERS: [(i64, &str); 2] = [(1, "Acme Repairs"), (2, "Globex")];

/// `(manager, agent)`
const MANAGED_AGENTS: [(i64, i64); 2] = [(3, 2), (3, 5)];

const LABELS: [(i64, &str, &str); 2] = [
    (1, "Warranty", "#1E90FF"),
    (2, "Parts Ordered", "#FFA500"),
];

impl InMemoryStore {
    /// A store seeded with branches, priorities, customers, labels and one
    /// user per role. User 6 is a manager without agents.
    #[must_use]
    pub fn with_demo_data() -> Self {
        let mut store = Self::new();
        for (id, name, email, role, branch) in USERS {
            let Ok(id) = UserId::new(id) else { continue };
            store = store.with_user(DirectoryUser {
                id,
                name: name.to_owned(),
                email: email.to_owned(),
                role,
                branch_id: branch.and_then(|raw| BranchId::new(raw).ok()),
            });
        }
        for (id, name) in BRANCHES {
            if let Ok(id) = BranchId::new(id) {
                store = store.with_branch(id, name);
            }
        }
        for (id, name) in PRIORITIES {
            if let Ok(id) = PriorityId::new(id) {
                store = store.with_priority(id, name);
            }
        }
        for (id, name) in CUSTOMERS {
            if let Ok(id) = CustomerId::new(id) {
                store = store.with_customer(id, name);
            }
        }
        for status in TicketStatus::ALL {
            store = store.with_status_name(status, status.label());
        }
        for (manager, agent) in MANAGED_AGENTS {
            if let (Ok(manager), Ok(agent)) = (UserId::new(manager), UserId::new(agent)) {
                store = store.with_managed_agent(manager, agent);
            }
        }
        for (id, name, color) in LABELS {
            if let (Ok(id), Ok(name), Ok(color)) =
                (LabelId::new(id), LabelName::new(name), LabelColor::new(color))
            {
                store = store.with_label(Label { id, name, color });
            }
        }
        store
    }
}

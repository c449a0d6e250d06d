//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use mockable::Clock;

use crate::domain::ports::{
    ActivityLog, ActivityRepository, ActorResolver, AssignmentCommand, AssignmentRepository,
    DirectoryRepository, LabelCatalog, LabelRepository, LoginService, TicketCommand, TicketQuery,
    TicketRepository, TrackingSequence,
};
use crate::domain::{
    ActivityLogService, AssignmentService, DirectoryService, LabelService, TicketCommandService,
    TicketQueryService,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub login: Arc<dyn LoginService>,
    pub actors: Arc<dyn ActorResolver>,
    pub tickets: Arc<dyn TicketCommand>,
    pub tickets_query: Arc<dyn TicketQuery>,
    pub assignments: Arc<dyn AssignmentCommand>,
    pub activity_log: Arc<dyn ActivityLog>,
    pub labels: Arc<dyn LabelCatalog>,
}

/// Driven-port adapters and settings the helpdesk services are built from.
pub struct HttpStatePorts<T, S, A, V, L, D> {
    pub tickets: Arc<T>,
    pub tracking: Arc<S>,
    pub assignments: Arc<A>,
    pub activities: Arc<V>,
    pub labels: Arc<L>,
    pub directory: Arc<D>,
    pub clock: Arc<dyn Clock>,
    /// Shared login password; `None` rejects every login.
    pub login_password: Option<String>,
}

impl HttpState {
    /// Build every domain service over one set of adapters.
    ///
    /// ```
    /// use std::sync::Arc;
    ///
    /// use helpdesk::inbound::http::state::{HttpState, HttpStatePorts};
    /// use helpdesk::outbound::memory::InMemoryStore;
    /// use mockable::DefaultClock;
    ///
    /// let store = Arc::new(InMemoryStore::with_demo_data());
    /// let _state = HttpState::from_ports(HttpStatePorts {
    ///     tickets: store.clone(),
    ///     tracking: store.clone(),
    ///     assignments: store.clone(),
    ///     activities: store.clone(),
    ///     labels: store.clone(),
    ///     directory: store,
    ///     clock: Arc::new(DefaultClock),
    ///     login_password: None,
    /// });
    /// ```
    pub fn from_ports<T, S, A, V, L, D>(ports: HttpStatePorts<T, S, A, V, L, D>) -> Self
    where
        T: TicketRepository + 'static,
        S: TrackingSequence + 'static,
        A: AssignmentRepository + 'static,
        V: ActivityRepository + 'static,
        L: LabelRepository + 'static,
        D: DirectoryRepository + 'static,
    {
        let HttpStatePorts {
            tickets,
            tracking,
            assignments,
            activities,
            labels,
            directory,
            clock,
            login_password,
        } = ports;

        let people = Arc::new(DirectoryService::new(directory.clone(), login_password));
        Self {
            login: people.clone(),
            actors: people,
            tickets: Arc::new(TicketCommandService::new(
                tickets.clone(),
                tracking,
                directory.clone(),
                clock.clone(),
            )),
            tickets_query: Arc::new(TicketQueryService::new(
                tickets.clone(),
                assignments.clone(),
                activities.clone(),
                directory.clone(),
            )),
            assignments: Arc::new(AssignmentService::new(
                tickets,
                assignments,
                labels.clone(),
                directory,
                clock.clone(),
            )),
            activity_log: Arc::new(ActivityLogService::new(activities, clock)),
            labels: Arc::new(LabelService::new(labels)),
        }
    }
}

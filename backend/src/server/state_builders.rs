//! Assemble [`HttpState`] over PostgreSQL or the in-memory store.

use std::sync::Arc;

use helpdesk::inbound::http::state::{HttpState, HttpStatePorts};
use helpdesk::outbound::memory::InMemoryStore;
use helpdesk::outbound::persistence::{
    DbPool, DieselActivityRepository, DieselAssignmentRepository, DieselDirectoryRepository,
    DieselLabelRepository, DieselTicketRepository, DieselTrackingSequence,
};
use mockable::DefaultClock;
use tracing::info;

use super::ServerConfig;

fn diesel_state(pool: &DbPool, login_password: Option<String>) -> HttpState {
    HttpState::from_ports(HttpStatePorts {
        tickets: Arc::new(DieselTicketRepository::new(pool.clone())),
        tracking: Arc::new(DieselTrackingSequence::new(pool.clone())),
        assignments: Arc::new(DieselAssignmentRepository::new(pool.clone())),
        activities: Arc::new(DieselActivityRepository::new(pool.clone())),
        labels: Arc::new(DieselLabelRepository::new(pool.clone())),
        directory: Arc::new(DieselDirectoryRepository::new(pool.clone())),
        clock: Arc::new(DefaultClock),
        login_password,
    })
}

fn memory_state(demo_data: bool, login_password: Option<String>) -> HttpState {
    let store = Arc::new(if demo_data {
        InMemoryStore::with_demo_data()
    } else {
        InMemoryStore::new()
    });
    HttpState::from_ports(HttpStatePorts {
        tickets: store.clone(),
        tracking: store.clone(),
        assignments: store.clone(),
        activities: store.clone(),
        labels: store.clone(),
        directory: store,
        clock: Arc::new(DefaultClock),
        login_password,
    })
}

/// PostgreSQL when a pool is configured, otherwise a fresh in-memory store.
pub(super) fn build_http_state(config: &ServerConfig) -> HttpState {
    let password = config.login_password.clone();
    match &config.db_pool {
        Some(pool) => {
            info!("serving tickets from PostgreSQL");
            diesel_state(pool, password)
        }
        None => {
            info!(demo_data = config.demo_data, "serving tickets from the in-memory store");
            memory_state(config.demo_data, password)
        }
    }
}

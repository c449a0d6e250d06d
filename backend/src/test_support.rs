//! Helpers for integration tests that drive the real HTTP stack over the
//! seeded in-memory store.
//!
//! Only compiled with the `test-support` feature.

use std::sync::{Arc, Mutex, MutexGuard};

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};
use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use crate::inbound::http::configure_api;
use crate::inbound::http::state::{HttpState, HttpStatePorts};
use crate::outbound::memory::InMemoryStore;

/// Password accepted for every demo user.
pub const DEMO_PASSWORD: &str = "password";

/// Demo accounts by role, as seeded by [`InMemoryStore::with_demo_data`].
pub mod demo_users {
    pub const ADMIN: (i64, &str) = (1, "admin@example.com");
    pub const AGENT: (i64, &str) = (2, "agent@example.com");
    pub const MANAGER: (i64, &str) = (3, "manager@example.com");
    pub const BRANCH_ADMIN: (i64, &str) = (4, "branch@example.com");
    pub const HARBOUR_AGENT: (i64, &str) = (5, "harbour.agent@example.com");
    /// Manager with no managed agents.
    pub const IDLE_MANAGER: (i64, &str) = (6, "idle.manager@example.com");
}

/// Clock that only moves when told to.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    /// 2025-01-01T09:00:00Z.
    pub fn fixed() -> Self {
        let start = Utc
            .with_ymd_and_hms(2025, 1, 1, 9, 0, 0)
            .single()
            .unwrap_or_else(Utc::now);
        Self::new(start)
    }

    pub fn advance_seconds(&self, seconds: i64) {
        *self.lock() += TimeDelta::seconds(seconds);
    }

    fn lock(&self) -> MutexGuard<'_, DateTime<Utc>> {
        self.0.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock()
    }
}

/// Services over a fresh demo store, accepting [`DEMO_PASSWORD`].
pub fn demo_state(clock: Arc<MutableClock>) -> HttpState {
    let store = Arc::new(InMemoryStore::with_demo_data());
    HttpState::from_ports(HttpStatePorts {
        tickets: store.clone(),
        tracking: store.clone(),
        assignments: store.clone(),
        activities: store.clone(),
        labels: store.clone(),
        directory: store,
        clock,
        login_password: Some(DEMO_PASSWORD.to_owned()),
    })
}

/// The production `/api` scope behind `key` and an insecure cookie.
///
/// Reuse one key across rebuilt apps so earlier session cookies stay valid.
pub fn demo_app(
    state: web::Data<HttpState>,
    key: Key,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let session = SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build();
    App::new()
        .app_data(state)
        .service(web::scope("/api").wrap(session).configure(configure_api))
}

/// Find the session cookie on a response, if one was set.
pub fn session_cookie(response: &ServiceResponse) -> Option<Cookie<'static>> {
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(Cookie::into_owned)
}

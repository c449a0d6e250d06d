//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_http::Request;
use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpResponse, test as actix_test, web};

use crate::domain::ports::{
    MockActivityLog, MockActorResolver, MockAssignmentCommand, MockLabelCatalog,
    MockLoginService, MockTicketCommand, MockTicketQuery,
};
use crate::domain::{Error, UserId};
use crate::inbound::http::error::{json_error_handler, path_error_handler, query_error_handler};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// One mock per driving port; set expectations before calling [`test_app`].
#[derive(Default)]
pub struct TestPorts {
    pub login: MockLoginService,
    pub actors: MockActorResolver,
    pub tickets: MockTicketCommand,
    pub tickets_query: MockTicketQuery,
    pub assignments: MockAssignmentCommand,
    pub activity_log: MockActivityLog,
    pub labels: MockLabelCatalog,
}

impl From<TestPorts> for HttpState {
    fn from(ports: TestPorts) -> Self {
        Self {
            login: Arc::new(ports.login),
            actors: Arc::new(ports.actors),
            tickets: Arc::new(ports.tickets),
            tickets_query: Arc::new(ports.tickets_query),
            assignments: Arc::new(ports.assignments),
            activity_log: Arc::new(ports.activity_log),
            labels: Arc::new(ports.labels),
        }
    }
}

const TEST_LOGIN_PATH: &str = "/__test/login/{id}";

async fn test_login(session: SessionContext, id: web::Path<i64>) -> Result<HttpResponse, Error> {
    let user_id = UserId::new(id.into_inner())
        .map_err(|err| Error::invalid_request(err.to_string()))?;
    session.persist_user(user_id)?;
    Ok(HttpResponse::Ok().finish())
}

/// App with session middleware, extractor error handlers, the mocked state
/// and a backdoor login route used by [`login_cookie`].
pub fn test_app(
    ports: TestPorts,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .wrap(test_session_middleware())
        .app_data(web::Data::new(HttpState::from(ports)))
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .route(TEST_LOGIN_PATH, web::post().to(test_login))
}

/// Log `user` in through the backdoor route and return the session cookie.
pub async fn login_cookie<S>(app: &S, user: UserId) -> Cookie<'static>
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let response = actix_test::call_service(
        app,
        actix_test::TestRequest::post()
            .uri(&format!("/__test/login/{user}"))
            .to_request(),
    )
    .await;
    assert!(response.status().is_success(), "test login failed");
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie set")
        .into_owned()
}

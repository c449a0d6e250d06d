//! HTTP inbound adapter exposing the helpdesk REST endpoints.
//!
//! Handlers translate JSON and path parameters into domain calls on the
//! driving ports held in [`state::HttpState`]. Everything under `/api` needs a
//! session cookie except `POST /api/login`.

pub mod activities;
pub mod assignments;
pub mod auth;
pub mod error;
pub mod health;
pub mod labels;
pub mod schemas;
pub mod session;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod tickets;
pub mod tickets_dto;
pub mod users;
pub mod validation;

use actix_web::web;

pub use error::ApiResult;

/// Register every `/api` route plus the extractor error handlers.
///
/// Mount inside a scope that already carries the session middleware:
///
/// ```
/// use actix_web::{App, web};
/// use helpdesk::inbound::http::configure_api;
///
/// let app = App::new().service(web::scope("/api").configure(configure_api));
/// ```
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(error::json_error_handler))
        .app_data(web::PathConfig::default().error_handler(error::path_error_handler))
        .app_data(web::QueryConfig::default().error_handler(error::query_error_handler))
        .service(users::login)
        .configure(tickets::configure)
        .service(activities::list_activities)
        .service(activities::record_activity)
        .configure(assignments::configure)
        .configure(labels::configure);
}

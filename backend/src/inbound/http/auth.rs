//! Authentication extractor used by HTTP handlers.
//!
//! Keep the HTTP modules focused on request/response mapping by resolving the
//! session user into a domain [`Actor`] here.

use std::ops::Deref;

use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;

use crate::domain::{Actor, Error};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// The acting user of an authenticated request.
///
/// Extraction fails with `401 Unauthorized` when the session carries no user
/// or the user no longer exists.
#[derive(Debug, Clone, Copy)]
pub struct CurrentActor(pub Actor);

impl Deref for CurrentActor {
    type Target = Actor;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequest for CurrentActor {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let session = SessionContext::from_request(req, payload);
        let state = req.app_data::<web::Data<HttpState>>().cloned();
        Box::pin(async move {
            let session = session.await?;
            let user_id = session.require_user_id()?;
            let state =
                state.ok_or_else(|| Error::internal("HTTP state is not configured"))?;
            let actor = state.actors.resolve(user_id).await?;
            Ok(CurrentActor(actor))
        })
    }
}

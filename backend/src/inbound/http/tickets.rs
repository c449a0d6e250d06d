//! Ticket lifecycle handlers.
//!
//! ```text
//! GET    /api/tickets            active tickets
//! GET    /api/tickets/closed     closed tickets
//! GET    /api/tickets/trashed    soft-deleted tickets
//! POST   /api/tickets            create
//! GET    /api/tickets/{id}       details
//! PUT    /api/tickets/{id}       sparse update
//! DELETE /api/tickets/{id}       soft delete
//! POST   /api/tickets/{id}/restore
//! ```
//!
//! The fixed listing paths must be registered before `/tickets/{id}` so
//! `closed` and `trashed` are not parsed as ids.

use actix_web::{HttpRequest, HttpResponse, delete, get, post, put, web};
use pagination::Paginated;

use crate::domain::{Error, TicketBucket, TicketId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::CurrentActor;
use crate::inbound::http::schemas::TicketPageSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::tickets_dto::{
    CreateTicketBody, ListTicketsQuery, TicketDetailsResponse, TicketResponse, UpdateTicketBody,
};
use crate::inbound::http::validation::{FieldName, parse_path_id};

pub(crate) const TICKET_ID: FieldName = FieldName::new("id");

pub(crate) fn ticket_path_id(raw: i64) -> Result<TicketId, Error> {
    parse_path_id(raw, TICKET_ID)
}

async fn list_bucket(
    req: &HttpRequest,
    actor: CurrentActor,
    state: &HttpState,
    query: ListTicketsQuery,
    bucket: TicketBucket,
) -> ApiResult<web::Json<Paginated<TicketResponse>>> {
    let query = query.into_query(bucket)?;
    let page = state.tickets_query.list_tickets(&actor, query).await?;
    let envelope =
        Paginated::from_page(page.map(TicketResponse::from)).with_links(&req.full_url());
    Ok(web::Json(envelope))
}

/// List active tickets (not deleted, not closed) visible to the caller.
#[utoipa::path(
    get,
    path = "/api/tickets",
    params(ListTicketsQuery),
    responses(
        (status = 200, description = "Active tickets", body = TicketPageSchema),
        (status = 400, description = "Invalid query", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 503, description = "Storage unavailable", body = Error)
    ),
    tags = ["tickets"],
    operation_id = "listActiveTickets"
)]
#[get("/tickets")]
pub async fn list_active(
    req: HttpRequest,
    actor: CurrentActor,
    state: web::Data<HttpState>,
    query: web::Query<ListTicketsQuery>,
) -> ApiResult<web::Json<Paginated<TicketResponse>>> {
    list_bucket(&req, actor, &state, query.into_inner(), TicketBucket::Active).await
}

#[utoipa::path(
    get,
    path = "/api/tickets/closed",
    params(ListTicketsQuery),
    responses(
        (status = 200, description = "Closed tickets", body = TicketPageSchema),
        (status = 400, description = "Invalid query", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["tickets"],
    operation_id = "listClosedTickets"
)]
#[get("/tickets/closed")]
pub async fn list_closed(
    req: HttpRequest,
    actor: CurrentActor,
    state: web::Data<HttpState>,
    query: web::Query<ListTicketsQuery>,
) -> ApiResult<web::Json<Paginated<TicketResponse>>> {
    list_bucket(&req, actor, &state, query.into_inner(), TicketBucket::Closed).await
}

#[utoipa::path(
    get,
    path = "/api/tickets/trashed",
    params(ListTicketsQuery),
    responses(
        (status = 200, description = "Soft-deleted tickets", body = TicketPageSchema),
        (status = 400, description = "Invalid query", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["tickets"],
    operation_id = "listTrashedTickets"
)]
#[get("/tickets/trashed")]
pub async fn list_trashed(
    req: HttpRequest,
    actor: CurrentActor,
    state: web::Data<HttpState>,
    query: web::Query<ListTicketsQuery>,
) -> ApiResult<web::Json<Paginated<TicketResponse>>> {
    list_bucket(&req, actor, &state, query.into_inner(), TicketBucket::Trashed).await
}

/// Open a ticket and allocate its tracking number.
#[utoipa::path(
    post,
    path = "/api/tickets",
    request_body = CreateTicketBody,
    responses(
        (status = 201, description = "Ticket created", body = TicketResponse),
        (status = 400, description = "Malformed body", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 422, description = "Validation failed", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["tickets"],
    operation_id = "createTicket"
)]
#[post("/tickets")]
pub async fn create_ticket(
    actor: CurrentActor,
    state: web::Data<HttpState>,
    payload: web::Json<CreateTicketBody>,
) -> ApiResult<HttpResponse> {
    let request = payload.into_inner().into_request()?;
    let ticket = state.tickets.create_ticket(&actor, request).await?;
    Ok(HttpResponse::Created().json(TicketResponse::from(ticket)))
}

#[utoipa::path(
    get,
    path = "/api/tickets/{id}",
    params(("id" = i64, Path, description = "Ticket id")),
    responses(
        (status = 200, description = "Ticket details", body = TicketDetailsResponse),
        (status = 400, description = "Invalid id", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Unknown, trashed or out of scope", body = Error)
    ),
    tags = ["tickets"],
    operation_id = "getTicket"
)]
#[get("/tickets/{id}")]
pub async fn get_ticket(
    actor: CurrentActor,
    state: web::Data<HttpState>,
    path: web::Path<i64>,
) -> ApiResult<web::Json<TicketDetailsResponse>> {
    let ticket_id = ticket_path_id(path.into_inner())?;
    let details = state.tickets_query.get_ticket(&actor, ticket_id).await?;
    Ok(web::Json(details.into()))
}

/// Apply a sparse update. Absent keys are unchanged and `null` clears.
#[utoipa::path(
    put,
    path = "/api/tickets/{id}",
    params(("id" = i64, Path, description = "Ticket id")),
    request_body = UpdateTicketBody,
    responses(
        (status = 200, description = "Updated ticket", body = TicketResponse),
        (status = 400, description = "Malformed body or id", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Unknown, trashed or out of scope", body = Error),
        (status = 422, description = "Validation failed", body = Error)
    ),
    tags = ["tickets"],
    operation_id = "updateTicket"
)]
#[put("/tickets/{id}")]
pub async fn update_ticket(
    actor: CurrentActor,
    state: web::Data<HttpState>,
    path: web::Path<i64>,
    payload: web::Json<UpdateTicketBody>,
) -> ApiResult<web::Json<TicketResponse>> {
    let ticket_id = ticket_path_id(path.into_inner())?;
    let patch = payload.into_inner().into_patch()?;
    let ticket = state.tickets.update_ticket(&actor, ticket_id, patch).await?;
    Ok(web::Json(ticket.into()))
}

#[utoipa::path(
    delete,
    path = "/api/tickets/{id}",
    params(("id" = i64, Path, description = "Ticket id")),
    responses(
        (status = 200, description = "Ticket moved to the trash"),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Only the creator, an admin or a manager may delete", body = Error),
        (status = 404, description = "Unknown, trashed or out of scope", body = Error)
    ),
    tags = ["tickets"],
    operation_id = "deleteTicket"
)]
#[delete("/tickets/{id}")]
pub async fn delete_ticket(
    actor: CurrentActor,
    state: web::Data<HttpState>,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let ticket_id = ticket_path_id(path.into_inner())?;
    state.tickets.delete_ticket(&actor, ticket_id).await?;
    Ok(HttpResponse::Ok().finish())
}

/// Bring a trashed ticket back. The ticket is reopened whatever its status was.
#[utoipa::path(
    post,
    path = "/api/tickets/{id}/restore",
    params(("id" = i64, Path, description = "Ticket id")),
    responses(
        (status = 200, description = "Restored ticket", body = TicketResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Only the creator, an admin or a manager may restore", body = Error),
        (status = 404, description = "Not trashed, unknown or out of scope", body = Error)
    ),
    tags = ["tickets"],
    operation_id = "restoreTicket"
)]
#[post("/tickets/{id}/restore")]
pub async fn restore_ticket(
    actor: CurrentActor,
    state: web::Data<HttpState>,
    path: web::Path<i64>,
) -> ApiResult<web::Json<TicketResponse>> {
    let ticket_id = ticket_path_id(path.into_inner())?;
    let ticket = state.tickets.restore_ticket(&actor, ticket_id).await?;
    Ok(web::Json(ticket.into()))
}

/// Register the ticket routes in a safe order.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_active)
        .service(list_closed)
        .service(list_trashed)
        .service(create_ticket)
        .service(get_ticket)
        .service(update_ticket)
        .service(delete_ticket)
        .service(restore_ticket);
}

#[cfg(test)]
#[path = "tickets_tests.rs"]
mod tests;

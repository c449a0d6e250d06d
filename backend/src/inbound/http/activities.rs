//! Activity log handlers.
//!
//! ```text
//! GET  /api/tickets/{id}/activities?taskId=&page=&perPage=
//! POST /api/tickets/{id}/activities {"type":"Task Completed","note":"..."}
//! ```

use actix_web::{HttpRequest, HttpResponse, get, post, web};
use pagination::Paginated;

use crate::domain::ports::RecordActivityRequest;
use crate::domain::{ActivityKind, Error, FieldErrors, TaskId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::CurrentActor;
use crate::inbound::http::schemas::ActivityPageSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::tickets::ticket_path_id;
use crate::inbound::http::tickets_dto::{ActivityResponse, ListActivitiesQuery, RecordActivityBody};
use crate::inbound::http::validation::{FieldName, check_optional_id};

/// Audit trail of a ticket, newest first. Trashed tickets keep their history.
#[utoipa::path(
    get,
    path = "/api/tickets/{id}/activities",
    params(("id" = i64, Path, description = "Ticket id"), ListActivitiesQuery),
    responses(
        (status = 200, description = "Activity entries", body = ActivityPageSchema),
        (status = 400, description = "Invalid id or query", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Unknown or out of scope", body = Error)
    ),
    tags = ["activities"],
    operation_id = "listTicketActivities"
)]
#[get("/tickets/{id}/activities")]
pub async fn list_activities(
    req: HttpRequest,
    actor: CurrentActor,
    state: web::Data<HttpState>,
    path: web::Path<i64>,
    query: web::Query<ListActivitiesQuery>,
) -> ApiResult<web::Json<Paginated<ActivityResponse>>> {
    let ticket_id = ticket_path_id(path.into_inner())?;
    let (task_id, page) = query.into_inner().into_parts()?;
    let activities = state
        .tickets_query
        .list_activities(&actor, ticket_id, task_id, page)
        .await?;
    let envelope =
        Paginated::from_page(activities.map(ActivityResponse::from)).with_links(&req.full_url());
    Ok(web::Json(envelope))
}

/// Append a free-form entry, typically a task event.
///
/// The write is best effort: storage failures are logged and the request is
/// still accepted.
#[utoipa::path(
    post,
    path = "/api/tickets/{id}/activities",
    params(("id" = i64, Path, description = "Ticket id")),
    request_body = RecordActivityBody,
    responses(
        (status = 202, description = "Entry accepted"),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Unknown, trashed or out of scope", body = Error),
        (status = 422, description = "Validation failed", body = Error)
    ),
    tags = ["activities"],
    operation_id = "recordTicketActivity"
)]
#[post("/tickets/{id}/activities")]
pub async fn record_activity(
    actor: CurrentActor,
    state: web::Data<HttpState>,
    path: web::Path<i64>,
    payload: web::Json<RecordActivityBody>,
) -> ApiResult<HttpResponse> {
    let ticket_id = ticket_path_id(path.into_inner())?;
    let body = payload.into_inner();

    let mut errors = FieldErrors::new();
    let task_id: Option<TaskId> =
        check_optional_id(&mut errors, FieldName::new("taskId"), body.task_id);
    let kind = match errors.check("type", ActivityKind::new(body.kind)) {
        Some(kind) if errors.is_empty() => kind,
        _ => return Err(errors.into_error()),
    };

    // Scope check: the caller must be able to see the ticket.
    state.tickets_query.get_ticket(&actor, ticket_id).await?;

    state
        .activity_log
        .record(RecordActivityRequest {
            ticket_id,
            task_id,
            kind,
            note: body.note,
            actor_id: actor.id(),
            extra: body.extra,
        })
        .await;
    Ok(HttpResponse::Accepted().finish())
}

//! Agent, notify-user and label assignment handlers.
//!
//! ```text
//! POST   /api/tickets/{id}/agents                {"userId":7}
//! PUT    /api/tickets/{id}/agents                {"agentIds":[7,8]}
//! DELETE /api/tickets/{id}/agents/{userId}
//! POST   /api/tickets/{id}/notify-users          {"userId":7}
//! DELETE /api/tickets/{id}/notify-users/{userId}
//! POST   /api/tickets/{id}/labels                {"labelId":2}
//! DELETE /api/tickets/{id}/labels/{labelId}
//! ```
//!
//! Attaching an existing pair and detaching an absent one both succeed with
//! `changed: false`.

use actix_web::{delete, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Error, FieldErrors, IdValidationError, LabelId, TicketId, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::CurrentActor;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::tickets::ticket_path_id;
use crate::inbound::http::validation::{FieldName, check_id_list, parse_path_id};

const USER_ID: FieldName = FieldName::new("userId");
const LABEL_ID: FieldName = FieldName::new("labelId");

/// Body naming one user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserRefBody {
    pub user_id: i64,
}

/// Body naming one label.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabelRefBody {
    pub label_id: i64,
}

/// Complete desired agent set.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncAgentsBody {
    pub agent_ids: Vec<i64>,
}

/// Whether an attach or detach touched a row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentOutcome {
    pub changed: bool,
}

/// Agents attached and detached by a bulk sync.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AgentSyncResponse {
    pub added: Vec<UserId>,
    pub removed: Vec<UserId>,
}

fn body_id<I>(field: FieldName, raw: i64) -> Result<I, Error>
where
    I: TryFrom<i64, Error = IdValidationError>,
{
    I::try_from(raw).map_err(|err| FieldErrors::single(field.as_str(), err.to_string()))
}

fn ticket_and_member<I>(raw: (i64, i64), field: FieldName) -> Result<(TicketId, I), Error>
where
    I: TryFrom<i64, Error = IdValidationError>,
{
    let (ticket, member) = raw;
    Ok((ticket_path_id(ticket)?, parse_path_id(member, field)?))
}

fn outcome(changed: bool) -> web::Json<AssignmentOutcome> {
    web::Json(AssignmentOutcome { changed })
}

#[utoipa::path(
    post,
    path = "/api/tickets/{id}/agents",
    params(("id" = i64, Path, description = "Ticket id")),
    request_body = UserRefBody,
    responses(
        (status = 200, description = "Agent attached or already present", body = AssignmentOutcome),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Unknown, trashed or out of scope ticket", body = Error),
        (status = 422, description = "Unknown user", body = Error)
    ),
    tags = ["assignments"],
    operation_id = "addTicketAgent"
)]
#[post("/tickets/{id}/agents")]
pub async fn add_agent(
    actor: CurrentActor,
    state: web::Data<HttpState>,
    path: web::Path<i64>,
    payload: web::Json<UserRefBody>,
) -> ApiResult<web::Json<AssignmentOutcome>> {
    let ticket_id = ticket_path_id(path.into_inner())?;
    let user_id: UserId = body_id(USER_ID, payload.user_id)?;
    let changed = state.assignments.add_agent(&actor, ticket_id, user_id).await?;
    Ok(outcome(changed))
}

/// Replace the agent set, touching only the difference.
#[utoipa::path(
    put,
    path = "/api/tickets/{id}/agents",
    params(("id" = i64, Path, description = "Ticket id")),
    request_body = SyncAgentsBody,
    responses(
        (status = 200, description = "Agents synchronised", body = AgentSyncResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Unknown, trashed or out of scope ticket", body = Error),
        (status = 422, description = "Unknown user", body = Error)
    ),
    tags = ["assignments"],
    operation_id = "syncTicketAgents"
)]
#[put("/tickets/{id}/agents")]
pub async fn sync_agents(
    actor: CurrentActor,
    state: web::Data<HttpState>,
    path: web::Path<i64>,
    payload: web::Json<SyncAgentsBody>,
) -> ApiResult<web::Json<AgentSyncResponse>> {
    let ticket_id = ticket_path_id(path.into_inner())?;
    let mut errors = FieldErrors::new();
    let agents = check_id_list(
        &mut errors,
        FieldName::new("agentIds"),
        payload.into_inner().agent_ids,
    );
    errors.finish()?;
    let sync = state.assignments.sync_agents(&actor, ticket_id, agents).await?;
    Ok(web::Json(AgentSyncResponse {
        added: sync.added,
        removed: sync.removed,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/tickets/{id}/agents/{user_id}",
    params(
        ("id" = i64, Path, description = "Ticket id"),
        ("user_id" = i64, Path, description = "Agent user id")
    ),
    responses(
        (status = 200, description = "Agent detached or already absent", body = AssignmentOutcome),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Unknown, trashed or out of scope ticket", body = Error)
    ),
    tags = ["assignments"],
    operation_id = "removeTicketAgent"
)]
#[delete("/tickets/{id}/agents/{user_id}")]
pub async fn remove_agent(
    actor: CurrentActor,
    state: web::Data<HttpState>,
    path: web::Path<(i64, i64)>,
) -> ApiResult<web::Json<AssignmentOutcome>> {
    let (ticket_id, user_id) = ticket_and_member::<UserId>(path.into_inner(), USER_ID)?;
    let changed = state.assignments.remove_agent(&actor, ticket_id, user_id).await?;
    Ok(outcome(changed))
}

#[utoipa::path(
    post,
    path = "/api/tickets/{id}/notify-users",
    params(("id" = i64, Path, description = "Ticket id")),
    request_body = UserRefBody,
    responses(
        (status = 200, description = "User added or already on the list", body = AssignmentOutcome),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Unknown, trashed or out of scope ticket", body = Error),
        (status = 422, description = "Unknown user", body = Error)
    ),
    tags = ["assignments"],
    operation_id = "addTicketNotifyUser"
)]
#[post("/tickets/{id}/notify-users")]
pub async fn add_notify_user(
    actor: CurrentActor,
    state: web::Data<HttpState>,
    path: web::Path<i64>,
    payload: web::Json<UserRefBody>,
) -> ApiResult<web::Json<AssignmentOutcome>> {
    let ticket_id = ticket_path_id(path.into_inner())?;
    let user_id: UserId = body_id(USER_ID, payload.user_id)?;
    let changed = state
        .assignments
        .add_notify_user(&actor, ticket_id, user_id)
        .await?;
    Ok(outcome(changed))
}

#[utoipa::path(
    delete,
    path = "/api/tickets/{id}/notify-users/{user_id}",
    params(
        ("id" = i64, Path, description = "Ticket id"),
        ("user_id" = i64, Path, description = "Notify user id")
    ),
    responses(
        (status = 200, description = "User removed or already absent", body = AssignmentOutcome),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Unknown, trashed or out of scope ticket", body = Error)
    ),
    tags = ["assignments"],
    operation_id = "removeTicketNotifyUser"
)]
#[delete("/tickets/{id}/notify-users/{user_id}")]
pub async fn remove_notify_user(
    actor: CurrentActor,
    state: web::Data<HttpState>,
    path: web::Path<(i64, i64)>,
) -> ApiResult<web::Json<AssignmentOutcome>> {
    let (ticket_id, user_id) = ticket_and_member::<UserId>(path.into_inner(), USER_ID)?;
    let changed = state
        .assignments
        .remove_notify_user(&actor, ticket_id, user_id)
        .await?;
    Ok(outcome(changed))
}

#[utoipa::path(
    post,
    path = "/api/tickets/{id}/labels",
    params(("id" = i64, Path, description = "Ticket id")),
    request_body = LabelRefBody,
    responses(
        (status = 200, description = "Label attached or already present", body = AssignmentOutcome),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Unknown, trashed or out of scope ticket", body = Error),
        (status = 422, description = "Unknown label", body = Error)
    ),
    tags = ["assignments"],
    operation_id = "addTicketLabel"
)]
#[post("/tickets/{id}/labels")]
pub async fn add_label(
    actor: CurrentActor,
    state: web::Data<HttpState>,
    path: web::Path<i64>,
    payload: web::Json<LabelRefBody>,
) -> ApiResult<web::Json<AssignmentOutcome>> {
    let ticket_id = ticket_path_id(path.into_inner())?;
    let label_id: LabelId = body_id(LABEL_ID, payload.label_id)?;
    let changed = state.assignments.add_label(&actor, ticket_id, label_id).await?;
    Ok(outcome(changed))
}

#[utoipa::path(
    delete,
    path = "/api/tickets/{id}/labels/{label_id}",
    params(
        ("id" = i64, Path, description = "Ticket id"),
        ("label_id" = i64, Path, description = "Label id")
    ),
    responses(
        (status = 200, description = "Label detached or already absent", body = AssignmentOutcome),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Unknown, trashed or out of scope ticket", body = Error)
    ),
    tags = ["assignments"],
    operation_id = "removeTicketLabel"
)]
#[delete("/tickets/{id}/labels/{label_id}")]
pub async fn remove_label(
    actor: CurrentActor,
    state: web::Data<HttpState>,
    path: web::Path<(i64, i64)>,
) -> ApiResult<web::Json<AssignmentOutcome>> {
    let (ticket_id, label_id) = ticket_and_member::<LabelId>(path.into_inner(), LABEL_ID)?;
    let changed = state
        .assignments
        .remove_label(&actor, ticket_id, label_id)
        .await?;
    Ok(outcome(changed))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(add_agent)
        .service(sync_agents)
        .service(remove_agent)
        .service(add_notify_user)
        .service(remove_notify_user)
        .service(add_label)
        .service(remove_label);
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use rstest::rstest;
    use serde_json::{Value, json};

    use super::*;
    use crate::domain::ports::AgentSync;
    use crate::domain::service_test_helpers::{branch, ticket_id, user};
    use crate::domain::{Actor, ErrorCode, Role};
    use crate::inbound::http::test_utils::{TestPorts, login_cookie, test_app};

    fn agent_ports() -> TestPorts {
        let mut ports = TestPorts::default();
        ports
            .actors
            .expect_resolve()
            .returning(|id| Ok(Actor::new(id, Role::Agent, Some(branch(1)))));
        ports
    }

    macro_rules! init_app {
        ($ports:expr) => {
            actix_test::init_service(test_app($ports).configure(configure)).await
        };
    }

    #[rstest]
    #[case(true)]
    #[case(false)]
    #[actix_web::test]
    async fn attaching_an_agent_reports_whether_anything_changed(#[case] changed: bool) {
        let mut ports = agent_ports();
        ports
            .assignments
            .expect_add_agent()
            .withf(|_, ticket, user_id| *ticket == ticket_id(3) && *user_id == user(7))
            .times(1)
            .return_once(move |_, _, _| Ok(changed));
        let app = init_app!(ports);
        let cookie = login_cookie(&app, user(5)).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/tickets/3/agents")
                .cookie(cookie)
                .set_json(json!({ "userId": 7 }))
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["changed"], changed);
    }

    #[actix_web::test]
    async fn sync_reports_the_delta() {
        let mut ports = agent_ports();
        ports
            .assignments
            .expect_sync_agents()
            .withf(|_, _, agents| agents == &vec![user(7), user(8)])
            .times(1)
            .return_once(|_, _, _| {
                Ok(AgentSync {
                    added: vec![user(8)],
                    removed: vec![user(6)],
                })
            });
        let app = init_app!(ports);
        let cookie = login_cookie(&app, user(5)).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::put()
                .uri("/tickets/3/agents")
                .cookie(cookie)
                .set_json(json!({ "agentIds": [7, 8] }))
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body, json!({ "added": [8], "removed": [6] }));
    }

    #[actix_web::test]
    async fn sync_rejects_non_positive_ids() {
        let app = init_app!(agent_ports());
        let cookie = login_cookie(&app, user(5)).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::put()
                .uri("/tickets/3/agents")
                .cookie(cookie)
                .set_json(json!({ "agentIds": [7, 0] }))
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = actix_test::read_body_json(response).await;
        assert!(body["details"]["fields"]["agentIds"].is_array());
    }

    #[actix_web::test]
    async fn detaching_a_notify_user_uses_both_path_ids() {
        let mut ports = agent_ports();
        ports
            .assignments
            .expect_remove_notify_user()
            .withf(|_, ticket, user_id| *ticket == ticket_id(3) && *user_id == user(9))
            .times(1)
            .return_once(|_, _, _| Ok(false));
        let app = init_app!(ports);
        let cookie = login_cookie(&app, user(5)).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::delete()
                .uri("/tickets/3/notify-users/9")
                .cookie(cookie)
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["changed"], false);
    }

    #[actix_web::test]
    async fn unknown_labels_surface_validation_errors() {
        let mut ports = agent_ports();
        ports
            .assignments
            .expect_add_label()
            .times(1)
            .return_once(|_, _, label| {
                Err(FieldErrors::single(
                    "labelId",
                    format!("label {label} does not exist"),
                ))
            });
        let app = init_app!(ports);
        let cookie = login_cookie(&app, user(5)).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/tickets/3/labels")
                .cookie(cookie)
                .set_json(json!({ "labelId": 44 }))
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["code"], json!(ErrorCode::ValidationFailed));
        assert_eq!(
            body["details"]["fields"]["labelId"][0],
            "label 44 does not exist"
        );
    }

    #[actix_web::test]
    async fn zero_label_ids_in_paths_are_bad_requests() {
        let app = init_app!(agent_ports());
        let cookie = login_cookie(&app, user(5)).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::delete()
                .uri("/tickets/3/labels/0")
                .cookie(cookie)
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

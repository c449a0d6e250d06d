//! Label catalogue handlers.
//!
//! ```text
//! GET    /api/labels
//! POST   /api/labels {"name":"Warranty","color":"#1E90FF"}
//! DELETE /api/labels/{id}
//! ```

use actix_web::{HttpResponse, delete, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::NewLabelRequest;
use crate::domain::{Error, LabelId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::CurrentActor;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::tickets_dto::LabelResponse;
use crate::inbound::http::validation::{FieldName, parse_path_id};

/// Body of `POST /api/labels`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLabelBody {
    #[schema(example = "Warranty")]
    pub name: String,
    #[schema(example = "#1E90FF")]
    pub color: String,
}

#[utoipa::path(
    get,
    path = "/api/labels",
    responses(
        (status = 200, description = "All labels by name", body = [LabelResponse]),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["labels"],
    operation_id = "listLabels"
)]
#[get("/labels")]
pub async fn list_labels(
    _actor: CurrentActor,
    state: web::Data<HttpState>,
) -> ApiResult<web::Json<Vec<LabelResponse>>> {
    let labels = state.labels.list_labels().await?;
    Ok(web::Json(labels.into_iter().map(LabelResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/labels",
    request_body = CreateLabelBody,
    responses(
        (status = 201, description = "Label created", body = LabelResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 422, description = "Invalid or duplicate name, or bad colour", body = Error)
    ),
    tags = ["labels"],
    operation_id = "createLabel"
)]
#[post("/labels")]
pub async fn create_label(
    _actor: CurrentActor,
    state: web::Data<HttpState>,
    payload: web::Json<CreateLabelBody>,
) -> ApiResult<HttpResponse> {
    let CreateLabelBody { name, color } = payload.into_inner();
    let label = state
        .labels
        .create_label(NewLabelRequest { name, color })
        .await?;
    Ok(HttpResponse::Created().json(LabelResponse::from(label)))
}

/// Delete a label no ticket references.
#[utoipa::path(
    delete,
    path = "/api/labels/{id}",
    params(("id" = i64, Path, description = "Label id")),
    responses(
        (status = 200, description = "Label deleted"),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Unknown label", body = Error),
        (status = 409, description = "Label still attached to tickets", body = Error)
    ),
    tags = ["labels"],
    operation_id = "deleteLabel"
)]
#[delete("/labels/{id}")]
pub async fn delete_label(
    _actor: CurrentActor,
    state: web::Data<HttpState>,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let id: LabelId = parse_path_id(path.into_inner(), FieldName::new("id"))?;
    state.labels.delete_label(id).await?;
    Ok(HttpResponse::Ok().finish())
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_labels)
        .service(create_label)
        .service(delete_label);
}

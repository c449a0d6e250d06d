//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] gathers every handler annotated with `#[utoipa::path]`, the
//! request and response DTOs, the page envelope wrappers from
//! [`crate::inbound::http::schemas`], and the session cookie security scheme.
//!
//! The document backs Swagger UI in debug builds and is exported with
//! `cargo run --bin openapi-dump` for client generation.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{Error, ErrorCode, TicketType};
use crate::inbound::http::assignments::{
    AgentSyncResponse, AssignmentOutcome, LabelRefBody, SyncAgentsBody, UserRefBody,
};
use crate::inbound::http::labels::CreateLabelBody;
use crate::inbound::http::schemas::{
    ActivityPageSchema, PageLinksSchema, PageMetaSchema, TicketPageSchema,
};
use crate::inbound::http::tickets_dto::{
    ActivityResponse, CreateTicketBody, LabelResponse, RecordActivityBody, TicketDetailsResponse,
    TicketResponse, UpdateTicketBody,
};
use crate::inbound::http::users::LoginRequest;

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/login.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Helpdesk API",
        description = "Ticket lifecycle, assignments, activity log and labels for a role-scoped helpdesk."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::users::login,
        crate::inbound::http::tickets::list_active,
        crate::inbound::http::tickets::list_closed,
        crate::inbound::http::tickets::list_trashed,
        crate::inbound::http::tickets::create_ticket,
        crate::inbound::http::tickets::get_ticket,
        crate::inbound::http::tickets::update_ticket,
        crate::inbound::http::tickets::delete_ticket,
        crate::inbound::http::tickets::restore_ticket,
        crate::inbound::http::activities::list_activities,
        crate::inbound::http::activities::record_activity,
        crate::inbound::http::assignments::add_agent,
        crate::inbound::http::assignments::sync_agents,
        crate::inbound::http::assignments::remove_agent,
        crate::inbound::http::assignments::add_notify_user,
        crate::inbound::http::assignments::remove_notify_user,
        crate::inbound::http::assignments::add_label,
        crate::inbound::http::assignments::remove_label,
        crate::inbound::http::labels::list_labels,
        crate::inbound::http::labels::create_label,
        crate::inbound::http::labels::delete_label,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        TicketType,
        LoginRequest,
        TicketResponse,
        TicketDetailsResponse,
        LabelResponse,
        ActivityResponse,
        CreateTicketBody,
        UpdateTicketBody,
        RecordActivityBody,
        UserRefBody,
        LabelRefBody,
        SyncAgentsBody,
        AssignmentOutcome,
        AgentSyncResponse,
        CreateLabelBody,
        PageMetaSchema,
        PageLinksSchema,
        TicketPageSchema,
        ActivityPageSchema,
    )),
    tags(
        (name = "users", description = "Session login"),
        (name = "tickets", description = "Ticket lifecycle"),
        (name = "activities", description = "Append-only audit log"),
        (name = "assignments", description = "Agents, notify users and labels on a ticket"),
        (name = "labels", description = "Label catalogue"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

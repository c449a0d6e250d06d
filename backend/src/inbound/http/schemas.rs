//! OpenAPI schema definitions for the page envelope.
//!
//! `pagination` stays framework-agnostic and does not derive `ToSchema`. The
//! wrappers here mirror its `{data, meta, links}` shape for each listing so
//! the generated document names concrete item types.

use utoipa::ToSchema;

use crate::inbound::http::tickets_dto::{ActivityResponse, TicketResponse};

/// OpenAPI schema for [`pagination::PageMeta`].
#[derive(ToSchema)]
#[schema(as = PageMeta)]
#[schema(rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct PageMetaSchema {
    #[schema(example = 1)]
    current_page: u32,
    #[schema(example = 15)]
    per_page: u32,
    #[schema(example = 42)]
    total: u64,
    #[schema(example = 3)]
    last_page: u64,
    /// One-based index of the first item, absent on an empty page.
    #[schema(example = 1)]
    from: Option<u64>,
    #[schema(example = 15)]
    to: Option<u64>,
}

/// OpenAPI schema for [`pagination::PageLinks`].
#[derive(ToSchema)]
#[schema(as = PageLinks)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct PageLinksSchema {
    #[schema(example = "http://localhost:8080/api/tickets?page=1&perPage=15")]
    first: String,
    last: String,
    prev: Option<String>,
    next: Option<String>,
}

/// A page of tickets.
#[derive(ToSchema)]
#[schema(as = TicketPage)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct TicketPageSchema {
    data: Vec<TicketResponse>,
    meta: PageMetaSchema,
    links: Option<PageLinksSchema>,
}

/// A page of activity log entries, newest first.
#[derive(ToSchema)]
#[schema(as = ActivityPage)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ActivityPageSchema {
    data: Vec<ActivityResponse>,
    meta: PageMetaSchema,
    links: Option<PageLinksSchema>,
}

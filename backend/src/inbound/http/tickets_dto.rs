//! Request and response payloads for the ticket endpoints.
//!
//! Wire keys are camelCase. Nullable update fields use [`double_option`] so
//! handlers can tell an absent key from an explicit `null`.

use chrono::{DateTime, Utc};
use pagination::PageRequest;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::NewTicketRequest;
use crate::domain::{
    Activity, ActivityId, BranchId, CustomerId, Error, FieldErrors, FieldUpdate,
    IdValidationError, Label, LabelId, PriorityId, TaskId, Ticket, TicketBucket, TicketDetails,
    TicketFilter, TicketId, TicketListQuery, TicketPatch, TicketStatus, TicketType, UserId,
};
use crate::inbound::http::validation::{FieldName, check_id_list, check_optional_id, double_option};

/// Ticket as returned by every ticket endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TicketResponse {
    pub id: TicketId,
    #[schema(example = "TKT0000042")]
    pub tracking_number: String,
    #[schema(example = "printer-jam-tkt0000042")]
    pub slug: String,
    pub issue: String,
    pub description: Option<String>,
    pub priority_id: Option<PriorityId>,
    /// Status code: 1 Open, 2 In Progress, 3 Closed, 4 Completed.
    #[schema(value_type = i16, example = 1)]
    pub status: i16,
    pub ticket_type: TicketType,
    pub due_date: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub customer_id: Option<CustomerId>,
    pub created_by: UserId,
    pub branch_id: Option<BranchId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<Ticket> for TicketResponse {
    fn from(ticket: Ticket) -> Self {
        Self {
            id: ticket.id,
            tracking_number: ticket.tracking_number.as_str().to_owned(),
            slug: ticket.slug,
            issue: ticket.issue,
            description: ticket.description,
            priority_id: ticket.priority_id,
            status: ticket.status.code(),
            ticket_type: ticket.ticket_type,
            due_date: ticket.due_date,
            closed_at: ticket.closed_at,
            customer_id: ticket.customer_id,
            created_by: ticket.created_by,
            branch_id: ticket.branch_id,
            created_at: ticket.created_at,
            updated_at: ticket.updated_at,
            deleted_at: ticket.deleted_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabelResponse {
    pub id: LabelId,
    #[schema(example = "Warranty")]
    pub name: String,
    #[schema(example = "#1E90FF")]
    pub color: String,
}

impl From<Label> for LabelResponse {
    fn from(label: Label) -> Self {
        Self {
            id: label.id,
            name: label.name.as_str().to_owned(),
            color: label.color.as_str().to_owned(),
        }
    }
}

/// Ticket plus its assignment sets.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TicketDetailsResponse {
    #[serde(flatten)]
    pub ticket: TicketResponse,
    pub agent_ids: Vec<UserId>,
    pub notify_user_ids: Vec<UserId>,
    pub labels: Vec<LabelResponse>,
}

impl From<TicketDetails> for TicketDetailsResponse {
    fn from(details: TicketDetails) -> Self {
        Self {
            ticket: details.ticket.into(),
            agent_ids: details.agent_ids,
            notify_user_ids: details.notify_user_ids,
            labels: details.labels.into_iter().map(LabelResponse::from).collect(),
        }
    }
}

/// One audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityResponse {
    pub id: ActivityId,
    pub ticket_id: TicketId,
    pub task_id: Option<TaskId>,
    #[serde(rename = "type")]
    #[schema(example = "Ticket Status Changed")]
    pub kind: String,
    #[schema(example = "Status changed from Open to Closed")]
    pub note: String,
    #[schema(value_type = Option<Object>)]
    pub extra: Option<Value>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

impl From<Activity> for ActivityResponse {
    fn from(activity: Activity) -> Self {
        Self {
            id: activity.id,
            ticket_id: activity.ticket_id,
            task_id: activity.task_id,
            kind: activity.kind.as_str().to_owned(),
            note: activity.note,
            extra: activity.extra,
            created_by: activity.created_by,
            created_at: activity.created_at,
        }
    }
}

/// Body of `POST /api/tickets`.
#[derive(Debug, Default, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketBody {
    #[serde(default)]
    #[schema(example = "Printer jam")]
    pub issue: String,
    pub description: Option<String>,
    pub priority_id: Option<i64>,
    /// Status code; defaults to Open.
    pub status: Option<i16>,
    /// `"In Shop"` (default) or `"On Site"`.
    #[schema(example = "In Shop")]
    pub ticket_type: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub customer_id: Option<i64>,
    pub branch_id: Option<i64>,
    #[serde(default)]
    pub agent_ids: Vec<i64>,
}

impl CreateTicketBody {
    /// Check wire-level shapes and build the command request.
    ///
    /// Existence checks happen in the domain; this only rejects values that
    /// cannot name anything at all.
    pub fn into_request(self) -> Result<NewTicketRequest, Error> {
        let mut errors = FieldErrors::new();
        let priority_id = check_optional_id(&mut errors, PRIORITY_ID, self.priority_id);
        let customer_id = check_optional_id(&mut errors, CUSTOMER_ID, self.customer_id);
        let branch_id = check_optional_id(&mut errors, BRANCH_ID, self.branch_id);
        let agent_ids = check_id_list(&mut errors, AGENT_IDS, self.agent_ids);
        let status = self
            .status
            .and_then(|code| errors.check("status", TicketStatus::from_code(code)));
        let ticket_type = match self.ticket_type {
            Some(raw) => errors
                .check("ticketType", raw.parse::<TicketType>())
                .unwrap_or_default(),
            None => TicketType::default(),
        };
        if !errors.is_empty() {
            return Err(errors.into_error());
        }
        Ok(NewTicketRequest {
            issue: self.issue,
            description: self.description,
            priority_id,
            status,
            ticket_type,
            due_date: self.due_date,
            customer_id,
            branch_id,
            agent_ids,
        })
    }
}

/// Body of `PUT /api/tickets/{id}`.
///
/// Absent keys leave a field alone; `null` clears a nullable field.
#[derive(Debug, Default, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTicketBody {
    pub status: Option<i16>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i64>)]
    pub priority_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i64>)]
    pub branch_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<DateTime<Utc>>)]
    pub due_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<DateTime<Utc>>)]
    pub closed_time: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i64>)]
    pub customer_id: Option<Option<i64>>,
    pub issue: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
}

impl UpdateTicketBody {
    pub fn into_patch(self) -> Result<TicketPatch, Error> {
        let mut errors = FieldErrors::new();
        let status = self
            .status
            .and_then(|code| errors.check("status", TicketStatus::from_code(code)));
        let priority_id = id_update(&mut errors, PRIORITY_ID, self.priority_id);
        let branch_id = id_update(&mut errors, BRANCH_ID, self.branch_id);
        let customer_id = id_update(&mut errors, CUSTOMER_ID, self.customer_id);
        if !errors.is_empty() {
            return Err(errors.into_error());
        }
        Ok(TicketPatch {
            status,
            priority_id,
            branch_id,
            due_date: FieldUpdate::from_nullable(self.due_date),
            closed_time: FieldUpdate::from_nullable(self.closed_time),
            customer_id,
            issue: self.issue,
            description: FieldUpdate::from_nullable(self.description),
        })
    }
}

const PRIORITY_ID: FieldName = FieldName::new("priorityId");
const CUSTOMER_ID: FieldName = FieldName::new("customerId");
const BRANCH_ID: FieldName = FieldName::new("branchId");
const AGENT_IDS: FieldName = FieldName::new("agentIds");

fn id_update<I>(
    errors: &mut FieldErrors,
    field: FieldName,
    raw: Option<Option<i64>>,
) -> FieldUpdate<I>
where
    I: TryFrom<i64, Error = IdValidationError>,
{
    match FieldUpdate::from_nullable(raw).try_map(I::try_from) {
        Ok(update) => update,
        Err(err) => {
            errors.push(field.as_str(), err.to_string());
            FieldUpdate::Keep
        }
    }
}

/// Query string accepted by the ticket listings.
#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListTicketsQuery {
    /// One-based page number, default 1.
    pub page: Option<u32>,
    /// Page size between 1 and 100, default 15.
    pub per_page: Option<u32>,
    /// Status code filter.
    pub status: Option<i16>,
    pub priority_id: Option<i64>,
    pub branch_id: Option<i64>,
    pub customer_id: Option<i64>,
    /// Case-insensitive substring of the issue or tracking number.
    pub search: Option<String>,
}

impl ListTicketsQuery {
    pub fn into_query(self, bucket: TicketBucket) -> Result<TicketListQuery, Error> {
        let page = page_request(self.page, self.per_page)?;
        let mut errors = FieldErrors::new();
        let status = self
            .status
            .and_then(|code| errors.check("status", TicketStatus::from_code(code)));
        let filter = TicketFilter {
            status,
            priority_id: check_optional_id(&mut errors, PRIORITY_ID, self.priority_id),
            branch_id: check_optional_id(&mut errors, BRANCH_ID, self.branch_id),
            customer_id: check_optional_id(&mut errors, CUSTOMER_ID, self.customer_id),
            search: self.search,
        };
        if !errors.is_empty() {
            return Err(invalid_query(errors));
        }
        Ok(TicketListQuery {
            bucket,
            filter,
            page,
        })
    }
}

/// Query string accepted by the activity listing.
#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListActivitiesQuery {
    /// Restrict to entries recorded for one task.
    pub task_id: Option<i64>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ListActivitiesQuery {
    pub fn into_parts(self) -> Result<(Option<TaskId>, PageRequest), Error> {
        let page = page_request(self.page, self.per_page)?;
        let mut errors = FieldErrors::new();
        let task_id = check_optional_id(&mut errors, FieldName::new("taskId"), self.task_id);
        if !errors.is_empty() {
            return Err(invalid_query(errors));
        }
        Ok((task_id, page))
    }
}

/// Body of `POST /api/tickets/{id}/activities`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordActivityBody {
    pub task_id: Option<i64>,
    #[serde(rename = "type")]
    #[schema(example = "Task Completed")]
    pub kind: String,
    pub note: String,
    #[schema(value_type = Option<Object>)]
    pub extra: Option<Value>,
}

fn page_request(page: Option<u32>, per_page: Option<u32>) -> Result<PageRequest, Error> {
    PageRequest::from_optional(page, per_page).map_err(|err| {
        Error::invalid_request(err.to_string()).with_details(json!({ "code": "invalid_page" }))
    })
}

fn invalid_query(errors: FieldErrors) -> Error {
    errors.into_invalid_request("invalid query parameters")
}

use crate::{
    commands::tooltracker::{CheckOutToolCommand, ReturnToolCommand},
    entities::{tool, tool_transaction, ToolStatus, TransactionStatus},
    errors::ServiceError,
    handlers::common::{created, paginated, ApiCreated, PageParams},
    services::tool_tracker::{TransactionDetails, TransactionScope},
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Checkout form. Every id is required; fields are optional at the serde
/// level so a missing one is reported as a 400 validation error.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CheckoutRequest {
    #[validate(required)]
    pub tool_id: Option<Uuid>,
    #[validate(required)]
    pub employee_id: Option<Uuid>,
    /// Work center the tool is taken to
    #[validate(required)]
    pub to_location_id: Option<Uuid>,
    /// Promised return date
    pub expected_return_date: Option<NaiveDate>,
    #[validate(length(max = 1000, message = "Notes cannot exceed 1000 characters"))]
    pub notes: Option<String>,
}

impl TryFrom<CheckoutRequest> for CheckOutToolCommand {
    type Error = ServiceError;

    fn try_from(request: CheckoutRequest) -> Result<Self, Self::Error> {
        request.validate()?;
        let missing = |field: &str| ServiceError::ValidationError(format!("{} is required", field));
        Ok(CheckOutToolCommand {
            tool_id: request.tool_id.ok_or_else(|| missing("tool_id"))?,
            employee_id: request.employee_id.ok_or_else(|| missing("employee_id"))?,
            to_location_id: request
                .to_location_id
                .ok_or_else(|| missing("to_location_id"))?,
            expected_return_date: request.expected_return_date,
            notes: request.notes.filter(|n| !n.trim().is_empty()),
        })
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ReturnRequest {
    /// Employee handing the tool back, if different from the borrower
    pub returned_by: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct WorkCenterLookupRequest {
    /// Part of a tool serial number
    pub serial: String,
}

/// Current work center name of the matched tool; empty when nothing matched
#[derive(Debug, Serialize, ToSchema)]
pub struct WorkCenterLookupResponse {
    pub wc: String,
}

#[derive(Debug, Deserialize, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TransactionListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// `checked_out` (default), `returned` or `all`
    pub status: Option<TransactionScope>,
}

/// A transaction as stored, with its derived ledger figures
#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionSummary {
    pub id: Uuid,
    pub tool_id: Uuid,
    pub employee_id: Uuid,
    pub from_location_id: Option<Uuid>,
    pub to_location_id: Option<Uuid>,
    pub checkout_date: DateTime<Utc>,
    pub expected_return_date: Option<NaiveDate>,
    pub return_date: Option<DateTime<Utc>>,
    pub return_employee_id: Option<Uuid>,
    pub status: TransactionStatus,
    pub notes: String,
    pub is_overdue: bool,
    /// Whole calendar days between checkout and return (or today)
    pub days_out: i64,
}

impl From<tool_transaction::Model> for TransactionSummary {
    fn from(model: tool_transaction::Model) -> Self {
        Self {
            is_overdue: model.is_overdue(),
            days_out: model.days_out(),
            id: model.id,
            tool_id: model.tool_id,
            employee_id: model.employee_id,
            from_location_id: model.from_location_id,
            to_location_id: model.to_location_id,
            checkout_date: model.checkout_date,
            expected_return_date: model.expected_return_date,
            return_date: model.return_date,
            return_employee_id: model.return_employee_id,
            status: model.status,
            notes: model.notes,
        }
    }
}

/// A transaction joined with the names of everything it references
#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionView {
    #[serde(flatten)]
    pub transaction: TransactionSummary,
    pub tool_name: Option<String>,
    pub tool_serial_number: Option<String>,
    pub employee_name: Option<String>,
    pub return_employee_name: Option<String>,
    pub from_location_name: Option<String>,
    pub to_location_name: Option<String>,
}

impl From<TransactionDetails> for TransactionView {
    fn from(details: TransactionDetails) -> Self {
        Self {
            tool_name: details.tool.as_ref().map(|t| t.name.clone()),
            tool_serial_number: details.tool.map(|t| t.serial_number),
            employee_name: details.employee.map(|e| e.display_name()),
            return_employee_name: details.return_employee.map(|e| e.display_name()),
            from_location_name: details.from_location.map(|wc| wc.name),
            to_location_name: details.to_location.map(|wc| wc.name),
            transaction: details.transaction.into(),
        }
    }
}

/// Tool and transaction after a checkout or return
#[derive(Debug, Serialize, ToSchema)]
pub struct LifecycleResponse {
    pub tool: ToolLifecycleState,
    pub transaction: TransactionSummary,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ToolLifecycleState {
    pub id: Uuid,
    pub serial_number: String,
    pub status: ToolStatus,
    pub assigned_to_id: Option<Uuid>,
    pub current_location_id: Option<Uuid>,
    pub checked_out_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub last_checked_in: Option<DateTime<Utc>>,
}

impl From<tool::Model> for ToolLifecycleState {
    fn from(model: tool::Model) -> Self {
        Self {
            id: model.id,
            serial_number: model.serial_number,
            status: model.status,
            assigned_to_id: model.assigned_to_id,
            current_location_id: model.current_location_id,
            checked_out_date: model.checked_out_date,
            due_date: model.due_date,
            last_checked_in: model.last_checked_in,
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/tool-tracker/checkouts",
    request_body = CheckoutRequest,
    responses(
        (status = 201, description = "Tool checked out", body = ApiResponse<LifecycleResponse>),
        (status = 400, description = "Missing or invalid fields", body = crate::errors::ErrorResponse),
        (status = 404, description = "Tool, employee or work center not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Tool is not available", body = crate::errors::ErrorResponse)
    ),
    tag = "tool-tracker"
)]
pub async fn check_out_tool(
    State(state): State<AppState>,
    Json(payload): Json<CheckoutRequest>,
) -> ApiCreated<LifecycleResponse> {
    let command = CheckOutToolCommand::try_from(payload)?;
    let result = state.services.tool_tracker.check_out(command).await?;

    Ok(created(LifecycleResponse {
        tool: result.tool.into(),
        transaction: result.transaction.into(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/tool-tracker/transactions/:id/return",
    request_body = ReturnRequest,
    params(("id" = Uuid, Path, description = "Transaction ID")),
    responses(
        (status = 200, description = "Tool returned", body = ApiResponse<LifecycleResponse>),
        (status = 404, description = "Transaction not found or already returned", body = crate::errors::ErrorResponse)
    ),
    tag = "tool-tracker"
)]
pub async fn return_tool(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Option<Json<ReturnRequest>>,
) -> ApiResult<LifecycleResponse> {
    let request = payload.map(|Json(body)| body).unwrap_or_default();
    let result = state
        .services
        .tool_tracker
        .return_tool(ReturnToolCommand {
            transaction_id: id,
            returned_by: request.returned_by,
        })
        .await?;

    Ok(Json(ApiResponse::success(LifecycleResponse {
        tool: result.tool.into(),
        transaction: result.transaction.into(),
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/tool-tracker/transactions",
    params(TransactionListQuery),
    responses(
        (status = 200, description = "Transactions, most recent checkout first", body = ApiResponse<PaginatedResponse<TransactionView>>)
    ),
    tag = "tool-tracker"
)]
pub async fn list_transactions(
    State(state): State<AppState>,
    Query(query): Query<TransactionListQuery>,
) -> ApiResult<PaginatedResponse<TransactionView>> {
    let (page, limit) = PageParams {
        page: query.page,
        limit: query.limit,
    }
    .resolve(&state.config);

    let (rows, total) = state
        .services
        .tool_tracker
        .list_transactions(query.status.unwrap_or_default(), page, limit)
        .await?;

    let items = rows.into_iter().map(TransactionView::from).collect();
    Ok(Json(ApiResponse::success(paginated(items, total, page, limit))))
}

#[utoipa::path(
    get,
    path = "/api/v1/tool-tracker/transactions/:id",
    params(("id" = Uuid, Path, description = "Transaction ID")),
    responses(
        (status = 200, description = "Transaction found", body = ApiResponse<TransactionView>),
        (status = 404, description = "Transaction not found", body = crate::errors::ErrorResponse)
    ),
    tag = "tool-tracker"
)]
pub async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<TransactionView> {
    let details = state.services.tool_tracker.get_transaction(id).await?;
    Ok(Json(ApiResponse::success(details.into())))
}

/// Resolves the current work center of a tool from part of its serial number
#[utoipa::path(
    post,
    path = "/api/v1/tool-tracker/work-center-lookup",
    request_body = WorkCenterLookupRequest,
    responses(
        (status = 200, description = "Work center name, empty when nothing matched", body = WorkCenterLookupResponse)
    ),
    tag = "tool-tracker"
)]
pub async fn lookup_work_center(
    State(state): State<AppState>,
    Json(payload): Json<WorkCenterLookupRequest>,
) -> Result<Json<WorkCenterLookupResponse>, ServiceError> {
    let wc = state
        .services
        .tool_tracker
        .lookup_work_center(&payload.serial)
        .await?;
    Ok(Json(WorkCenterLookupResponse { wc }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_checkout_field_is_a_validation_error() {
        let request = CheckoutRequest {
            tool_id: Some(Uuid::new_v4()),
            employee_id: None,
            to_location_id: Some(Uuid::new_v4()),
            expected_return_date: None,
            notes: None,
        };
        let err = CheckOutToolCommand::try_from(request).unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(ref m) if m.contains("employee_id")));
    }

    #[test]
    fn checkout_form_reports_every_missing_id() {
        let request = CheckoutRequest {
            tool_id: None,
            employee_id: None,
            to_location_id: None,
            expected_return_date: None,
            notes: None,
        };
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("tool_id"));
        assert!(fields.contains_key("employee_id"));
        assert!(fields.contains_key("to_location_id"));
    }

    #[test]
    fn blank_notes_are_dropped() {
        let request = CheckoutRequest {
            tool_id: Some(Uuid::new_v4()),
            employee_id: Some(Uuid::new_v4()),
            to_location_id: Some(Uuid::new_v4()),
            expected_return_date: None,
            notes: Some("   ".into()),
        };
        let command = CheckOutToolCommand::try_from(request).unwrap();
        assert!(command.notes.is_none());
    }
}

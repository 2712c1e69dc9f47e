use crate::{
    entities::{tool, work_center, ToolStatus},
    errors::ServiceError,
    handlers::{
        common::{created, paginated, ApiCreated, PageParams},
        tool_tracker::TransactionSummary,
    },
    services::tools::{CreateTool, ToolFilter, UpdateTool},
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

const UNASSIGNED_LOCATION: &str = "Unassigned";

#[derive(Debug, Deserialize, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ToolListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<ToolStatus>,
    pub calibrated: Option<bool>,
    /// Only tools currently at this work center
    pub location_id: Option<Uuid>,
    /// Substring of the name or serial number
    pub search: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ToolSummary {
    pub id: Uuid,
    pub name: String,
    pub serial_number: String,
    pub calibrated: bool,
    /// `"Calibrated"` or `"Requires Calibration"`
    pub calibration_status: String,
    pub description: Option<String>,
    pub current_location_id: Option<Uuid>,
    /// Name of the current work center, `"Unassigned"` when there is none
    pub location_name: String,
    pub status: ToolStatus,
    pub status_label: String,
    pub assigned_to_id: Option<Uuid>,
    pub checked_out_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub last_checked_in: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<(tool::Model, Option<work_center::Model>)> for ToolSummary {
    fn from((model, location): (tool::Model, Option<work_center::Model>)) -> Self {
        Self {
            calibration_status: model.calibration_status().to_string(),
            location_name: location
                .map(|wc| wc.name)
                .unwrap_or_else(|| UNASSIGNED_LOCATION.to_string()),
            status_label: model.status.label().to_string(),
            id: model.id,
            name: model.name,
            serial_number: model.serial_number,
            calibrated: model.calibrated,
            description: model.description,
            current_location_id: model.current_location_id,
            status: model.status,
            assigned_to_id: model.assigned_to_id,
            checked_out_date: model.checked_out_date,
            due_date: model.due_date,
            last_checked_in: model.last_checked_in,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignLocationRequest {
    pub location_id: Uuid,
}

#[utoipa::path(
    get,
    path = "/api/v1/tools",
    params(ToolListQuery),
    responses(
        (status = 200, description = "Tools listed by serial number", body = ApiResponse<PaginatedResponse<ToolSummary>>)
    ),
    tag = "tools"
)]
pub async fn list_tools(
    State(state): State<AppState>,
    Query(query): Query<ToolListQuery>,
) -> ApiResult<PaginatedResponse<ToolSummary>> {
    let (page, limit) = PageParams {
        page: query.page,
        limit: query.limit,
    }
    .resolve(&state.config);

    let filter = ToolFilter {
        status: query.status,
        calibrated: query.calibrated,
        location_id: query.location_id,
        search: query.search,
    };
    let (rows, total) = state.services.tools.list(filter, page, limit).await?;

    let items = rows.into_iter().map(ToolSummary::from).collect();
    Ok(Json(ApiResponse::success(paginated(items, total, page, limit))))
}

#[utoipa::path(
    get,
    path = "/api/v1/tools/:id",
    params(("id" = Uuid, Path, description = "Tool ID")),
    responses(
        (status = 200, description = "Tool found", body = ApiResponse<ToolSummary>),
        (status = 404, description = "Tool not found", body = crate::errors::ErrorResponse)
    ),
    tag = "tools"
)]
pub async fn get_tool(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<ToolSummary> {
    let found = state.services.tools.get_with_location(id).await?;
    Ok(Json(ApiResponse::success(found.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/tools",
    request_body = CreateTool,
    responses(
        (status = 201, description = "Tool created", body = ApiResponse<ToolSummary>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Work center not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Serial number already in use", body = crate::errors::ErrorResponse)
    ),
    tag = "tools"
)]
pub async fn create_tool(
    State(state): State<AppState>,
    Json(payload): Json<CreateTool>,
) -> ApiCreated<ToolSummary> {
    let tool = state.services.tools.create(payload).await?;
    let with_location = state.services.tools.get_with_location(tool.id).await?;
    Ok(created(with_location.into()))
}

#[utoipa::path(
    put,
    path = "/api/v1/tools/:id",
    request_body = UpdateTool,
    params(("id" = Uuid, Path, description = "Tool ID")),
    responses(
        (status = 200, description = "Tool updated", body = ApiResponse<ToolSummary>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Tool or work center not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Serial number in use, or status change on a checked-out tool", body = crate::errors::ErrorResponse)
    ),
    tag = "tools"
)]
pub async fn update_tool(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTool>,
) -> ApiResult<ToolSummary> {
    state.services.tools.update(id, payload).await?;
    let with_location = state.services.tools.get_with_location(id).await?;
    Ok(Json(ApiResponse::success(with_location.into())))
}

#[utoipa::path(
    put,
    path = "/api/v1/tools/:id/location",
    request_body = AssignLocationRequest,
    params(("id" = Uuid, Path, description = "Tool ID")),
    responses(
        (status = 200, description = "Tool moved", body = ApiResponse<ToolSummary>),
        (status = 404, description = "Tool or work center not found", body = crate::errors::ErrorResponse)
    ),
    tag = "tools"
)]
pub async fn assign_tool_location(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignLocationRequest>,
) -> ApiResult<ToolSummary> {
    state
        .services
        .tools
        .assign_to_location(id, payload.location_id)
        .await?;
    let with_location = state.services.tools.get_with_location(id).await?;
    Ok(Json(ApiResponse::success(with_location.into())))
}

#[utoipa::path(
    delete,
    path = "/api/v1/tools/:id",
    params(("id" = Uuid, Path, description = "Tool ID")),
    responses(
        (status = 204, description = "Tool deleted with its transactions and measurements"),
        (status = 404, description = "Tool not found", body = crate::errors::ErrorResponse)
    ),
    tag = "tools"
)]
pub async fn delete_tool(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.tools.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/tools/:id/transactions",
    params(("id" = Uuid, Path, description = "Tool ID")),
    responses(
        (status = 200, description = "Checkout history, newest first", body = ApiResponse<Vec<TransactionSummary>>),
        (status = 404, description = "Tool not found", body = crate::errors::ErrorResponse)
    ),
    tag = "tools"
)]
pub async fn tool_transactions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<TransactionSummary>> {
    let rows = state.services.tools.transactions(id).await?;
    Ok(Json(ApiResponse::success(
        rows.into_iter().map(TransactionSummary::from).collect(),
    )))
}

use crate::{
    entities::{tool, work_center},
    handlers::common::{created, paginated, ApiCreated, PageParams},
    services::work_centers::{CreateWorkCenter, UpdateWorkCenter, WorkCenterFilter},
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

#[derive(Debug, Deserialize, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WorkCenterListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// Only active (`true`) or inactive (`false`) work centers
    pub active: Option<bool>,
    /// Substring of the name or location
    pub search: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[schema(example = json!({
    "id": "6d7f3a8e-0b1c-4a55-9d3e-2f8a1c4b7e90",
    "name": "Assembly Line A",
    "location": "Building 1",
    "supervisor": "Dana Reyes",
    "description": null,
    "is_active": true,
    "display_info": "Assembly Line A - Building 1 (Supervisor: Dana Reyes)",
    "created_at": "2024-12-09T10:30:00Z",
    "updated_at": "2024-12-09T10:30:00Z"
}))]
pub struct WorkCenterSummary {
    pub id: Uuid,
    pub name: String,
    pub location: String,
    pub supervisor: String,
    pub description: Option<String>,
    pub is_active: bool,
    /// `"{name} - {location} (Supervisor: {supervisor})"`
    pub display_info: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<work_center::Model> for WorkCenterSummary {
    fn from(model: work_center::Model) -> Self {
        Self {
            display_info: model.display_info(),
            id: model.id,
            name: model.name,
            location: model.location,
            supervisor: model.supervisor,
            description: model.description,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// A tool located at the work center
#[derive(Debug, Serialize, ToSchema)]
pub struct LocatedTool {
    pub id: Uuid,
    pub name: String,
    pub serial_number: String,
    pub calibrated: bool,
}

impl From<tool::Model> for LocatedTool {
    fn from(model: tool::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            serial_number: model.serial_number,
            calibrated: model.calibrated,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WorkCenterDetail {
    #[serde(flatten)]
    pub work_center: WorkCenterSummary,
    pub tool_count: u64,
    pub calibrated_tool_count: u64,
    pub tools: Vec<LocatedTool>,
}

#[utoipa::path(
    get,
    path = "/api/v1/work-centers",
    params(WorkCenterListQuery),
    responses(
        (status = 200, description = "Work centers listed", body = ApiResponse<PaginatedResponse<WorkCenterSummary>>)
    ),
    tag = "work-centers"
)]
pub async fn list_work_centers(
    State(state): State<AppState>,
    Query(query): Query<WorkCenterListQuery>,
) -> ApiResult<PaginatedResponse<WorkCenterSummary>> {
    let (page, limit) = PageParams {
        page: query.page,
        limit: query.limit,
    }
    .resolve(&state.config);

    let filter = WorkCenterFilter {
        active: query.active,
        search: query.search,
    };
    let (rows, total) = state
        .services
        .work_centers
        .list(filter, page, limit)
        .await?;

    let items = rows.into_iter().map(WorkCenterSummary::from).collect();
    Ok(Json(ApiResponse::success(paginated(items, total, page, limit))))
}

#[utoipa::path(
    get,
    path = "/api/v1/work-centers/:id",
    params(("id" = Uuid, Path, description = "Work center ID")),
    responses(
        (status = 200, description = "Work center with the tools located there", body = ApiResponse<WorkCenterDetail>),
        (status = 404, description = "Work center not found", body = crate::errors::ErrorResponse)
    ),
    tag = "work-centers"
)]
pub async fn get_work_center(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<WorkCenterDetail> {
    let details = state.services.work_centers.details(id).await?;
    let calibrated_tool_count = details.tools.iter().filter(|t| t.calibrated).count() as u64;

    Ok(Json(ApiResponse::success(WorkCenterDetail {
        work_center: details.work_center.into(),
        tool_count: details.tools.len() as u64,
        calibrated_tool_count,
        tools: details.tools.into_iter().map(LocatedTool::from).collect(),
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/work-centers",
    request_body = CreateWorkCenter,
    responses(
        (status = 201, description = "Work center created", body = ApiResponse<WorkCenterSummary>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 409, description = "Name already in use", body = crate::errors::ErrorResponse)
    ),
    tag = "work-centers"
)]
pub async fn create_work_center(
    State(state): State<AppState>,
    Json(payload): Json<CreateWorkCenter>,
) -> ApiCreated<WorkCenterSummary> {
    let created_wc = state.services.work_centers.create(payload).await?;
    Ok(created(created_wc.into()))
}

#[utoipa::path(
    put,
    path = "/api/v1/work-centers/:id",
    request_body = UpdateWorkCenter,
    params(("id" = Uuid, Path, description = "Work center ID")),
    responses(
        (status = 200, description = "Work center updated", body = ApiResponse<WorkCenterSummary>),
        (status = 404, description = "Work center not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Name already in use", body = crate::errors::ErrorResponse)
    ),
    tag = "work-centers"
)]
pub async fn update_work_center(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateWorkCenter>,
) -> ApiResult<WorkCenterSummary> {
    let updated = state.services.work_centers.update(id, payload).await?;
    Ok(Json(ApiResponse::success(updated.into())))
}

#[utoipa::path(
    delete,
    path = "/api/v1/work-centers/:id",
    params(("id" = Uuid, Path, description = "Work center ID")),
    responses(
        (status = 204, description = "Work center deleted; references to it are cleared"),
        (status = 404, description = "Work center not found", body = crate::errors::ErrorResponse)
    ),
    tag = "work-centers"
)]
pub async fn delete_work_center(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, crate::errors::ServiceError> {
    state.services.work_centers.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

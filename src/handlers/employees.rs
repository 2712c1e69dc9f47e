use crate::{
    entities::employee,
    errors::ServiceError,
    handlers::{
        common::{created, paginated, ApiCreated, PageParams},
        tool_tracker::{TransactionSummary, TransactionView},
    },
    services::employees::{CreateEmployee, EmployeeFilter, UpdateEmployee},
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Deserialize, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EmployeeListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub active: Option<bool>,
    /// Exact department name
    pub department: Option<String>,
    /// Substring of first name, last name or employee number
    pub search: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EmployeeSummary {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    /// `"{full name} ({employee number})"`
    pub display_name: String,
    pub employee_number: String,
    pub department: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub is_active: bool,
    pub primary_work_center_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<employee::Model> for EmployeeSummary {
    fn from(model: employee::Model) -> Self {
        Self {
            full_name: model.full_name(),
            display_name: model.display_name(),
            id: model.id,
            first_name: model.first_name,
            last_name: model.last_name,
            employee_number: model.employee_number,
            department: model.department,
            email: model.email,
            phone: model.phone,
            hire_date: model.hire_date,
            is_active: model.is_active,
            primary_work_center_id: model.primary_work_center_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/employees",
    params(EmployeeListQuery),
    responses(
        (status = 200, description = "Employees listed", body = ApiResponse<PaginatedResponse<EmployeeSummary>>)
    ),
    tag = "employees"
)]
pub async fn list_employees(
    State(state): State<AppState>,
    Query(query): Query<EmployeeListQuery>,
) -> ApiResult<PaginatedResponse<EmployeeSummary>> {
    let (page, limit) = PageParams {
        page: query.page,
        limit: query.limit,
    }
    .resolve(&state.config);

    let filter = EmployeeFilter {
        active: query.active,
        department: query.department,
        search: query.search,
    };
    let (rows, total) = state.services.employees.list(filter, page, limit).await?;

    let items = rows.into_iter().map(EmployeeSummary::from).collect();
    Ok(Json(ApiResponse::success(paginated(items, total, page, limit))))
}

#[utoipa::path(
    get,
    path = "/api/v1/employees/:id",
    params(("id" = Uuid, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee found", body = ApiResponse<EmployeeSummary>),
        (status = 404, description = "Employee not found", body = crate::errors::ErrorResponse)
    ),
    tag = "employees"
)]
pub async fn get_employee(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<EmployeeSummary> {
    let employee = state.services.employees.get(id).await?;
    Ok(Json(ApiResponse::success(employee.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/employees",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created", body = ApiResponse<EmployeeSummary>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Primary work center not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Employee number already in use", body = crate::errors::ErrorResponse)
    ),
    tag = "employees"
)]
pub async fn create_employee(
    State(state): State<AppState>,
    Json(payload): Json<CreateEmployee>,
) -> ApiCreated<EmployeeSummary> {
    let employee = state.services.employees.create(payload).await?;
    Ok(created(employee.into()))
}

#[utoipa::path(
    put,
    path = "/api/v1/employees/:id",
    request_body = UpdateEmployee,
    params(("id" = Uuid, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee updated", body = ApiResponse<EmployeeSummary>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Employee not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Employee number already in use", body = crate::errors::ErrorResponse)
    ),
    tag = "employees"
)]
pub async fn update_employee(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateEmployee>,
) -> ApiResult<EmployeeSummary> {
    let employee = state.services.employees.update(id, payload).await?;
    Ok(Json(ApiResponse::success(employee.into())))
}

#[utoipa::path(
    delete,
    path = "/api/v1/employees/:id",
    params(("id" = Uuid, Path, description = "Employee ID")),
    responses(
        (status = 204, description = "Employee and their history deleted"),
        (status = 404, description = "Employee not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Employee still holds a checked-out tool", body = crate::errors::ErrorResponse)
    ),
    tag = "employees"
)]
pub async fn delete_employee(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.employees.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/employees/:id/transactions",
    params(("id" = Uuid, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Checkout history, newest first", body = ApiResponse<Vec<TransactionSummary>>),
        (status = 404, description = "Employee not found", body = crate::errors::ErrorResponse)
    ),
    tag = "employees"
)]
pub async fn employee_transactions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<TransactionSummary>> {
    let rows = state.services.employees.transactions(id).await?;
    Ok(Json(ApiResponse::success(
        rows.into_iter().map(TransactionSummary::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/employees/:id/overdue-tools",
    params(("id" = Uuid, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Open checkouts past their promised return date", body = ApiResponse<Vec<TransactionView>>),
        (status = 404, description = "Employee not found", body = crate::errors::ErrorResponse)
    ),
    tag = "employees"
)]
pub async fn employee_overdue_tools(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<TransactionView>> {
    let rows = state.services.tool_tracker.overdue_tools(id).await?;
    Ok(Json(ApiResponse::success(
        rows.into_iter().map(TransactionView::from).collect(),
    )))
}

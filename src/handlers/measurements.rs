use crate::{
    entities::{tool_measure::SIZE_SCALE, MeasureCondition},
    errors::ServiceError,
    handlers::common::{created, paginated, ApiCreated},
    services::measurements::{CreateMeasurement, MeasurementDetails},
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

const EXPORT_FILE_NAME: &str = "tool_measurements.csv";

#[derive(Debug, Deserialize, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MeasurementListQuery {
    pub page: Option<u64>,
    /// Defaults to the configured measurement page size
    pub limit: Option<u64>,
    pub tool_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MeasurementView {
    pub id: Uuid,
    pub tool_id: Uuid,
    pub tool_name: Option<String>,
    pub tool_serial_number: Option<String>,
    pub employee_id: Uuid,
    pub employee_name: Option<String>,
    pub work_center_id: Option<Uuid>,
    pub work_center_name: Option<String>,
    pub measurement_date: DateTime<Utc>,
    /// Sizes are decimal strings with four places, e.g. `"10.0049"`
    pub size_measured: Decimal,
    pub expected_size: Option<Decimal>,
    pub tolerance: Option<Decimal>,
    /// `size_measured - expected_size`
    pub variance: Option<Decimal>,
    /// Absent unless both expected size and tolerance are recorded
    pub within_tolerance: Option<bool>,
    pub condition: MeasureCondition,
    pub condition_label: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

impl From<MeasurementDetails> for MeasurementView {
    fn from(details: MeasurementDetails) -> Self {
        let measure = details.measure;
        Self {
            variance: measure.variance().map(at_scale),
            within_tolerance: measure.is_within_tolerance(),
            condition_label: measure.condition.label().to_string(),
            tool_name: details.tool.as_ref().map(|t| t.name.clone()),
            tool_serial_number: details.tool.map(|t| t.serial_number),
            employee_name: details.employee.map(|e| e.display_name()),
            work_center_name: details.work_center.map(|wc| wc.name),
            id: measure.id,
            tool_id: measure.tool_id,
            employee_id: measure.employee_id,
            work_center_id: measure.work_center_id,
            measurement_date: measure.measurement_date,
            size_measured: at_scale(measure.size_measured),
            expected_size: measure.expected_size.map(at_scale),
            tolerance: measure.tolerance.map(at_scale),
            condition: measure.condition,
            notes: measure.notes,
            created_at: measure.created_at,
        }
    }
}

fn at_scale(mut value: Decimal) -> Decimal {
    value.rescale(SIZE_SCALE);
    value
}

#[utoipa::path(
    get,
    path = "/api/v1/measurements",
    params(MeasurementListQuery),
    responses(
        (status = 200, description = "Measurements, newest first", body = ApiResponse<PaginatedResponse<MeasurementView>>)
    ),
    tag = "measurements"
)]
pub async fn list_measurements(
    State(state): State<AppState>,
    Query(query): Query<MeasurementListQuery>,
) -> ApiResult<PaginatedResponse<MeasurementView>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(state.config.measurement_page_size)
        .clamp(1, state.config.api_max_page_size);

    let (rows, total) = state
        .services
        .measurements
        .list(query.tool_id, page, limit)
        .await?;

    let items = rows.into_iter().map(MeasurementView::from).collect();
    Ok(Json(ApiResponse::success(paginated(items, total, page, limit))))
}

#[utoipa::path(
    get,
    path = "/api/v1/measurements/:id",
    params(("id" = Uuid, Path, description = "Measurement ID")),
    responses(
        (status = 200, description = "Measurement found", body = ApiResponse<MeasurementView>),
        (status = 404, description = "Measurement not found", body = crate::errors::ErrorResponse)
    ),
    tag = "measurements"
)]
pub async fn get_measurement(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<MeasurementView> {
    let details = state.services.measurements.get(id).await?;
    Ok(Json(ApiResponse::success(details.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/measurements",
    request_body = CreateMeasurement,
    responses(
        (status = 201, description = "Measurement recorded", body = ApiResponse<MeasurementView>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Tool, employee or work center not found", body = crate::errors::ErrorResponse)
    ),
    tag = "measurements"
)]
pub async fn create_measurement(
    State(state): State<AppState>,
    Json(payload): Json<CreateMeasurement>,
) -> ApiCreated<MeasurementView> {
    let details = state.services.measurements.create(payload).await?;
    Ok(created(details.into()))
}

#[utoipa::path(
    delete,
    path = "/api/v1/measurements/:id",
    params(("id" = Uuid, Path, description = "Measurement ID")),
    responses(
        (status = 204, description = "Measurement deleted"),
        (status = 404, description = "Measurement not found", body = crate::errors::ErrorResponse)
    ),
    tag = "measurements"
)]
pub async fn delete_measurement(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.measurements.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Downloads every measurement as CSV
#[utoipa::path(
    get,
    path = "/api/v1/measurements/export",
    responses(
        (status = 200, description = "CSV attachment", content_type = "text/csv", body = String)
    ),
    tag = "measurements"
)]
pub async fn export_measurements(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let body = state.services.measurements.export_csv().await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME),
            ),
        ],
        body,
    )
        .into_response())
}

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "ToolTrack API",
        version = "0.1.0",
        description = r#"
# ToolTrack Manufacturing Tool Tracking API

Tracks shop-floor tools, the employees who borrow them and the work centers
they move between.

## Features

- **Work Centers**: Shop-floor locations with their resident tools
- **Employees**: Borrowers, with checkout history and overdue tools
- **Tools**: Serial-numbered tools with status and calibration flag
- **Tool Tracker**: Atomic checkout and return, open-transaction ledger, serial lookup
- **Measurements**: Calibration measurements with tolerance checks and CSV export

## Error Handling

Errors share one JSON body with the HTTP status reason, a message, the
request id and a timestamp:

```json
{
  "error": "Conflict",
  "message": "Conflict: Tool Torque Wrench (TW-000123) is already checked out",
  "request_id": "1b4e28ba-2fa1-11d2-883f-0016d3cca427",
  "timestamp": "2024-01-01T00:00:00Z"
}
```

## Pagination

List endpoints accept `page` (default 1) and `limit` (default 20, max 100).
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "work-centers", description = "Work center management endpoints"),
        (name = "employees", description = "Employee management endpoints"),
        (name = "tools", description = "Tool management endpoints"),
        (name = "tool-tracker", description = "Checkout and return endpoints"),
        (name = "measurements", description = "Calibration measurement endpoints")
    ),
    paths(
        // Work centers
        crate::handlers::work_centers::list_work_centers,
        crate::handlers::work_centers::get_work_center,
        crate::handlers::work_centers::create_work_center,
        crate::handlers::work_centers::update_work_center,
        crate::handlers::work_centers::delete_work_center,

        // Employees
        crate::handlers::employees::list_employees,
        crate::handlers::employees::get_employee,
        crate::handlers::employees::create_employee,
        crate::handlers::employees::update_employee,
        crate::handlers::employees::delete_employee,
        crate::handlers::employees::employee_transactions,
        crate::handlers::employees::employee_overdue_tools,

        // Tools
        crate::handlers::tools::list_tools,
        crate::handlers::tools::get_tool,
        crate::handlers::tools::create_tool,
        crate::handlers::tools::update_tool,
        crate::handlers::tools::assign_tool_location,
        crate::handlers::tools::delete_tool,
        crate::handlers::tools::tool_transactions,

        // Tool tracker
        crate::handlers::tool_tracker::check_out_tool,
        crate::handlers::tool_tracker::return_tool,
        crate::handlers::tool_tracker::list_transactions,
        crate::handlers::tool_tracker::get_transaction,
        crate::handlers::tool_tracker::lookup_work_center,

        // Measurements
        crate::handlers::measurements::list_measurements,
        crate::handlers::measurements::get_measurement,
        crate::handlers::measurements::create_measurement,
        crate::handlers::measurements::delete_measurement,
        crate::handlers::measurements::export_measurements,
    ),
    components(
        schemas(
            crate::ResponseMeta,
            crate::entities::ToolStatus,
            crate::entities::TransactionStatus,
            crate::entities::MeasureCondition,
            crate::services::tool_tracker::TransactionScope,

            crate::handlers::work_centers::WorkCenterSummary,
            crate::handlers::work_centers::WorkCenterDetail,
            crate::handlers::work_centers::LocatedTool,
            crate::services::work_centers::CreateWorkCenter,
            crate::services::work_centers::UpdateWorkCenter,

            crate::handlers::employees::EmployeeSummary,
            crate::services::employees::CreateEmployee,
            crate::services::employees::UpdateEmployee,

            crate::handlers::tools::ToolSummary,
            crate::handlers::tools::AssignLocationRequest,
            crate::services::tools::CreateTool,
            crate::services::tools::UpdateTool,

            crate::handlers::tool_tracker::CheckoutRequest,
            crate::handlers::tool_tracker::ReturnRequest,
            crate::handlers::tool_tracker::WorkCenterLookupRequest,
            crate::handlers::tool_tracker::WorkCenterLookupResponse,
            crate::handlers::tool_tracker::TransactionSummary,
            crate::handlers::tool_tracker::TransactionView,
            crate::handlers::tool_tracker::LifecycleResponse,
            crate::handlers::tool_tracker::ToolLifecycleState,

            crate::handlers::measurements::MeasurementView,
            crate::services::measurements::CreateMeasurement,

            // Error types
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_lists_tool_tracker_paths() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("ToolTrack API"));
        assert!(json.contains("/api/v1/tool-tracker/checkouts"));
        assert!(json.contains("/api/v1/measurements/export"));
    }
}

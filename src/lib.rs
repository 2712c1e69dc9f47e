//! ToolTrack API Library
//!
//! Manufacturing tool tracking: work centers, employees, tools, the
//! checkout/return ledger and calibration measurements.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod commands;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod health;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod repositories;
pub mod services;
pub mod tracing;

use axum::{
    response::Json,
    routing::{get, post, put},
    Router,
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use utoipa::ToSchema;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

impl AppState {
    /// Wires every service over one pool and event channel
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        event_sender: events::EventSender,
    ) -> Self {
        let services = handlers::AppServices::new(db.clone(), Arc::new(event_sender.clone()));
        Self {
            db,
            config,
            event_sender,
            services,
        }
    }
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn validation_errors(errors: Vec<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some("Validation failed".to_string()),
            errors: Some(errors),
            meta: Some(ResponseMeta::capture()),
        }
    }
}

#[cfg(test)]
mod response_tests {
    use super::*;
    use chrono::DateTime;

    #[tokio::test]
    async fn success_response_includes_request_metadata() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("meta-123"), async {
                ApiResponse::success("ok")
            })
            .await;

        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-123"));
        DateTime::parse_from_rfc3339(&meta.timestamp).expect("timestamp should parse");
    }

    #[tokio::test]
    async fn error_response_includes_request_metadata() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("meta-err"), async {
                ApiResponse::<()>::error("oops".into())
            })
            .await;

        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-err"));
        assert!(!meta.timestamp.is_empty());
    }

    #[tokio::test]
    async fn validation_errors_response_includes_metadata() {
        let response = crate::tracing::scope_request_id(
            crate::tracing::RequestId::new("meta-validation"),
            async { ApiResponse::<()>::validation_errors(vec!["missing".into()]) },
        )
        .await;

        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-validation"));
        assert_eq!(response.errors.as_deref(), Some(&["missing".to_string()][..]));
        DateTime::parse_from_rfc3339(&meta.timestamp).expect("timestamp should parse");
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

pub fn api_v1_routes() -> Router<AppState> {
    let work_centers = Router::new()
        .route(
            "/",
            get(handlers::work_centers::list_work_centers)
                .post(handlers::work_centers::create_work_center),
        )
        .route(
            "/:id",
            get(handlers::work_centers::get_work_center)
                .put(handlers::work_centers::update_work_center)
                .delete(handlers::work_centers::delete_work_center),
        );

    let employees = Router::new()
        .route(
            "/",
            get(handlers::employees::list_employees).post(handlers::employees::create_employee),
        )
        .route(
            "/:id",
            get(handlers::employees::get_employee)
                .put(handlers::employees::update_employee)
                .delete(handlers::employees::delete_employee),
        )
        .route(
            "/:id/transactions",
            get(handlers::employees::employee_transactions),
        )
        .route(
            "/:id/overdue-tools",
            get(handlers::employees::employee_overdue_tools),
        );

    let tools = Router::new()
        .route(
            "/",
            get(handlers::tools::list_tools).post(handlers::tools::create_tool),
        )
        .route(
            "/:id",
            get(handlers::tools::get_tool)
                .put(handlers::tools::update_tool)
                .delete(handlers::tools::delete_tool),
        )
        .route("/:id/location", put(handlers::tools::assign_tool_location))
        .route("/:id/transactions", get(handlers::tools::tool_transactions));

    let tool_tracker = Router::new()
        .route("/checkouts", post(handlers::tool_tracker::check_out_tool))
        .route(
            "/transactions",
            get(handlers::tool_tracker::list_transactions),
        )
        .route(
            "/transactions/:id",
            get(handlers::tool_tracker::get_transaction),
        )
        .route(
            "/transactions/:id/return",
            post(handlers::tool_tracker::return_tool),
        )
        .route(
            "/work-center-lookup",
            post(handlers::tool_tracker::lookup_work_center),
        );

    let measurements = Router::new()
        .route(
            "/",
            get(handlers::measurements::list_measurements)
                .post(handlers::measurements::create_measurement),
        )
        .route("/export", get(handlers::measurements::export_measurements))
        .route(
            "/:id",
            get(handlers::measurements::get_measurement)
                .delete(handlers::measurements::delete_measurement),
        );

    Router::new()
        .route("/status", get(api_status))
        .nest("/work-centers", work_centers)
        .nest("/employees", employees)
        .nest("/tools", tools)
        .nest("/tool-tracker", tool_tracker)
        .nest("/measurements", measurements)
}

/// Full application router: health, the v1 API, Swagger UI and the shared
/// request-id, tracing and compression layers. CORS is left to the binary.
pub fn app_router(state: AppState) -> Router {
    let health = health::health_routes(state.db.clone());

    Router::<AppState>::new()
        .route("/", get(|| async { "tooltrack-api up" }))
        .nest("/api/v1", api_v1_routes())
        .merge(openapi::swagger_ui())
        .with_state(state)
        .nest("/health", health)
        // HTTP tracing layer for consistent request/response telemetry
        .layer(crate::tracing::configure_http_tracing())
        .layer(CompressionLayer::new())
        // Ensure every request carries a request id for traceability
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
}

async fn api_status() -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let status_data = json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "tooltrack-api",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(status_data)))
}

/*!
 * # Health Check Module
 *
 * - Basic health check (`/health`) - up status with version and uptime
 * - Database check (`/health/db`) - pings the database and reports the backend
 * - Version (`/health/version`) - build information
 */

use crate::db::{backend_name, DbPool};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{debug, error};

/// Health check state
#[derive(Clone)]
pub struct HealthState {
    pub db_pool: Arc<DbPool>,
    pub start_time: SystemTime,
}

impl HealthState {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self {
            db_pool,
            start_time: SystemTime::now(),
        }
    }

    /// Calculate system uptime
    pub fn uptime(&self) -> u64 {
        SystemTime::now()
            .duration_since(self.start_time)
            .unwrap_or(Duration::from_secs(0))
            .as_secs()
    }
}

/// Returns build and version information
pub async fn version_info() -> impl IntoResponse {
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "commit": option_env!("GIT_HASH").unwrap_or("unknown"),
        "built": option_env!("BUILD_TIME").unwrap_or("unknown"),
    }))
}

/// Basic health check endpoint
pub async fn health_check(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    debug!("Health check endpoint called");

    (
        StatusCode::OK,
        Json(json!({
            "status": "up",
            "version": env!("CARGO_PKG_VERSION"),
            "uptime_seconds": state.uptime(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}

/// Database connectivity check
pub async fn database_health(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    match crate::db::check_connection(&state.db_pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "connected",
                "database": backend_name(&state.db_pool),
            })),
        ),
        Err(e) => {
            error!("Database health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "error",
                    "message": e.to_string(),
                })),
            )
        }
    }
}

/// Creates router with health check endpoints
pub fn health_routes(db_pool: Arc<DbPool>) -> Router {
    let health_state = Arc::new(HealthState::new(db_pool));

    Router::new()
        .route("/", get(health_check))
        .route("/db", get(database_health))
        .route("/version", get(version_info))
        .with_state(health_state)
}

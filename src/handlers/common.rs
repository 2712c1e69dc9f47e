use crate::{config::AppConfig, errors::ServiceError, ApiResponse, PaginatedResponse};
use axum::{http::StatusCode, Json};
use serde::Deserialize;
use utoipa::IntoParams;

/// Result type of handlers answering `201 Created`
pub type ApiCreated<T> = Result<(StatusCode, Json<ApiResponse<T>>), ServiceError>;

pub fn created<T>(data: T) -> (StatusCode, Json<ApiResponse<T>>) {
    (StatusCode::CREATED, Json(ApiResponse::success(data)))
}

/// Pagination parameters for list operations
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    /// 1-based page number
    pub page: Option<u64>,
    /// Page size, capped at the configured maximum
    pub limit: Option<u64>,
}

impl PageParams {
    /// Page number and limit after applying configured defaults and bounds
    pub fn resolve(&self, config: &AppConfig) -> (u64, u64) {
        (self.page.unwrap_or(1).max(1), config.page_limit(self.limit))
    }
}

pub fn paginated<T>(items: Vec<T>, total: u64, page: u64, limit: u64) -> PaginatedResponse<T> {
    let total_pages = if limit == 0 { 0 } else { total.div_ceil(limit) };
    PaginatedResponse {
        items,
        total,
        page,
        limit,
        total_pages,
    }
}

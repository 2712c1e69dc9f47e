use crate::entities::{employee, tool, work_center};
use crate::errors::ServiceError;
use sea_orm::{
    sea_query::{Expr, Func, LikeExpr, SimpleExpr},
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
};
use std::collections::HashMap;
use uuid::Uuid;

pub mod employees;
pub mod measurements;
pub mod tool_tracker;
pub mod tools;
pub mod work_centers;

/// Case-insensitive substring match on a text column, with `%` and `_` in
/// the fragment matched literally.
pub(crate) fn contains_ignore_case<C: ColumnTrait>(column: C, fragment: &str) -> SimpleExpr {
    let escaped = fragment
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    let pattern = LikeExpr::new(format!("%{}%", escaped.to_uppercase())).escape('\\');
    Expr::expr(Func::upper(Expr::col(column))).like(pattern)
}

fn distinct(ids: impl IntoIterator<Item = Uuid>) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = ids.into_iter().collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

pub(crate) async fn load_tools<C: ConnectionTrait>(
    db: &C,
    ids: impl IntoIterator<Item = Uuid>,
) -> Result<HashMap<Uuid, tool::Model>, ServiceError> {
    let ids = distinct(ids);
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = tool::Entity::find()
        .filter(tool::Column::Id.is_in(ids))
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|t| (t.id, t)).collect())
}

pub(crate) async fn load_employees<C: ConnectionTrait>(
    db: &C,
    ids: impl IntoIterator<Item = Uuid>,
) -> Result<HashMap<Uuid, employee::Model>, ServiceError> {
    let ids = distinct(ids);
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = employee::Entity::find()
        .filter(employee::Column::Id.is_in(ids))
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|e| (e.id, e)).collect())
}

pub(crate) async fn load_work_centers<C: ConnectionTrait>(
    db: &C,
    ids: impl IntoIterator<Item = Uuid>,
) -> Result<HashMap<Uuid, work_center::Model>, ServiceError> {
    let ids = distinct(ids);
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = work_center::Entity::find()
        .filter(work_center::Column::Id.is_in(ids))
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|w| (w.id, w)).collect())
}

/// Fails with `NotFound` unless a work center with `id` exists
pub(crate) async fn ensure_work_center<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> Result<work_center::Model, ServiceError> {
    work_center::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Work center", id))
}

/// Fails with `NotFound` unless an employee with `id` exists
pub(crate) async fn ensure_employee<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> Result<employee::Model, ServiceError> {
    employee::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Employee", id))
}

/// Fails with `NotFound` unless a tool with `id` exists
pub(crate) async fn ensure_tool<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> Result<tool::Model, ServiceError> {
    tool::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Tool", id))
}

use crate::{
    db::DbPool,
    entities::{employee, tool, tool_measure, tool_transaction, work_center},
    errors::ServiceError,
    events::{Event, EventSender},
};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateWorkCenter {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,
    #[validate(length(max = 100))]
    #[serde(default)]
    pub location: String,
    #[validate(length(max = 100))]
    #[serde(default)]
    pub supervisor: String,
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Partial update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateWorkCenter {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 100))]
    pub location: Option<String>,
    #[validate(length(max = 100))]
    pub supervisor: Option<String>,
    /// An empty string clears the description
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct WorkCenterFilter {
    pub active: Option<bool>,
    pub search: Option<String>,
}

/// A work center together with the tools currently located there
#[derive(Debug, Clone)]
pub struct WorkCenterDetails {
    pub work_center: work_center::Model,
    pub tools: Vec<tool::Model>,
}

fn default_true() -> bool {
    true
}

fn duplicate_name(name: &str) -> String {
    format!("Work center named '{}' already exists", name)
}

/// Service for managing work centers
#[derive(Clone)]
pub struct WorkCenterService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl WorkCenterService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self))]
    pub async fn create(&self, input: CreateWorkCenter) -> Result<work_center::Model, ServiceError> {
        input.validate()?;
        let name = input.name.trim().to_string();

        let created = work_center::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.clone()),
            location: Set(input.location),
            supervisor: Set(input.supervisor),
            description: Set(input.description.filter(|d| !d.is_empty())),
            is_active: Set(input.is_active),
            ..Default::default()
        }
        .insert(self.db_pool.as_ref())
        .await
        .map_err(|e| ServiceError::from_write(e, duplicate_name(&name)))?;

        info!(work_center_id = %created.id, "Work center created");
        self.event_sender
            .send_or_log(Event::WorkCenterCreated(created.id))
            .await;
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<work_center::Model, ServiceError> {
        super::ensure_work_center(self.db_pool.as_ref(), id).await
    }

    /// Work center plus the tools located there, ordered by serial number
    #[instrument(skip(self))]
    pub async fn details(&self, id: Uuid) -> Result<WorkCenterDetails, ServiceError> {
        let db = self.db_pool.as_ref();
        let work_center = super::ensure_work_center(db, id).await?;
        let tools = tool::Entity::find()
            .filter(tool::Column::CurrentLocationId.eq(id))
            .order_by_asc(tool::Column::SerialNumber)
            .all(db)
            .await?;
        Ok(WorkCenterDetails { work_center, tools })
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: WorkCenterFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<work_center::Model>, u64), ServiceError> {
        let db = self.db_pool.as_ref();
        let mut condition = Condition::all();
        if let Some(active) = filter.active {
            condition = condition.add(work_center::Column::IsActive.eq(active));
        }
        if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            condition = condition.add(
                Condition::any()
                    .add(super::contains_ignore_case(work_center::Column::Name, search.trim()))
                    .add(super::contains_ignore_case(
                        work_center::Column::Location,
                        search.trim(),
                    )),
            );
        }

        let total = work_center::Entity::find()
            .filter(condition.clone())
            .count(db)
            .await?;

        let offset = page.saturating_sub(1) * limit;
        let rows = work_center::Entity::find()
            .filter(condition)
            .order_by_asc(work_center::Column::Name)
            .offset(offset)
            .limit(limit)
            .all(db)
            .await?;

        Ok((rows, total))
    }

    #[instrument(skip(self))]
    pub async fn update(
        &self,
        id: Uuid,
        changes: UpdateWorkCenter,
    ) -> Result<work_center::Model, ServiceError> {
        changes.validate()?;
        let db = self.db_pool.as_ref();
        let existing = super::ensure_work_center(db, id).await?;
        let name = changes
            .name
            .as_deref()
            .map(str::trim)
            .unwrap_or(&existing.name)
            .to_string();

        let mut active: work_center::ActiveModel = existing.into();
        if changes.name.is_some() {
            active.name = Set(name.clone());
        }
        if let Some(location) = changes.location {
            active.location = Set(location);
        }
        if let Some(supervisor) = changes.supervisor {
            active.supervisor = Set(supervisor);
        }
        if let Some(description) = changes.description {
            active.description = Set(Some(description).filter(|d| !d.is_empty()));
        }
        if let Some(is_active) = changes.is_active {
            active.is_active = Set(is_active);
        }

        let updated = active
            .update(db)
            .await
            .map_err(|e| ServiceError::from_write(e, duplicate_name(&name)))?;

        self.event_sender
            .send_or_log(Event::WorkCenterUpdated(updated.id))
            .await;
        Ok(updated)
    }

    /// Deletes a work center. Every reference to it (tool locations, primary
    /// work centers, transaction endpoints, measurement sites) is nulled in
    /// the same transaction.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        self.db_pool
            .transaction::<_, (), ServiceError>(move |txn| {
                Box::pin(async move {
                    super::ensure_work_center(txn, id).await?;

                    tool::Entity::update_many()
                        .col_expr(tool::Column::CurrentLocationId, Expr::value(None::<Uuid>))
                        .filter(tool::Column::CurrentLocationId.eq(id))
                        .exec(txn)
                        .await?;
                    employee::Entity::update_many()
                        .col_expr(
                            employee::Column::PrimaryWorkCenterId,
                            Expr::value(None::<Uuid>),
                        )
                        .filter(employee::Column::PrimaryWorkCenterId.eq(id))
                        .exec(txn)
                        .await?;
                    tool_transaction::Entity::update_many()
                        .col_expr(
                            tool_transaction::Column::FromLocationId,
                            Expr::value(None::<Uuid>),
                        )
                        .filter(tool_transaction::Column::FromLocationId.eq(id))
                        .exec(txn)
                        .await?;
                    tool_transaction::Entity::update_many()
                        .col_expr(
                            tool_transaction::Column::ToLocationId,
                            Expr::value(None::<Uuid>),
                        )
                        .filter(tool_transaction::Column::ToLocationId.eq(id))
                        .exec(txn)
                        .await?;
                    tool_measure::Entity::update_many()
                        .col_expr(
                            tool_measure::Column::WorkCenterId,
                            Expr::value(None::<Uuid>),
                        )
                        .filter(tool_measure::Column::WorkCenterId.eq(id))
                        .exec(txn)
                        .await?;

                    work_center::Entity::delete_by_id(id).exec(txn).await?;
                    Ok(())
                })
            })
            .await?;

        info!(work_center_id = %id, "Work center deleted");
        self.event_sender
            .send_or_log(Event::WorkCenterDeleted(id))
            .await;
        Ok(())
    }
}

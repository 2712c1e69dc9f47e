use crate::{
    db::DbPool,
    entities::{tool, tool_measure, tool_transaction, work_center, ToolStatus},
    errors::ServiceError,
    events::{Event, EventSender},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateTool {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 50, message = "Serial number must be between 1 and 50 characters"))]
    pub serial_number: String,
    #[serde(default)]
    pub calibrated: bool,
    pub description: Option<String>,
    pub current_location_id: Option<Uuid>,
    /// Defaults to `available`; `checked_out` is only reachable through a checkout
    pub status: Option<ToolStatus>,
}

/// Partial update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateTool {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub serial_number: Option<String>,
    pub calibrated: Option<bool>,
    /// An empty string clears the description
    pub description: Option<String>,
    pub current_location_id: Option<Uuid>,
    pub status: Option<ToolStatus>,
}

#[derive(Debug, Clone, Default)]
pub struct ToolFilter {
    pub status: Option<ToolStatus>,
    pub calibrated: Option<bool>,
    pub location_id: Option<Uuid>,
    pub search: Option<String>,
}

fn duplicate_serial(serial: &str) -> String {
    format!("Tool with serial number '{}' already exists", serial)
}

fn reject_checked_out(status: Option<ToolStatus>) -> Result<(), ServiceError> {
    if status == Some(ToolStatus::CheckedOut) {
        return Err(ServiceError::ValidationError(
            "Tools can only be checked out through the tool tracker".to_string(),
        ));
    }
    Ok(())
}

/// Service for managing the tool register
#[derive(Clone)]
pub struct ToolService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl ToolService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self))]
    pub async fn create(&self, input: CreateTool) -> Result<tool::Model, ServiceError> {
        input.validate()?;
        reject_checked_out(input.status)?;
        let db = self.db_pool.as_ref();
        if let Some(location) = input.current_location_id {
            super::ensure_work_center(db, location).await?;
        }

        let serial = input.serial_number.trim().to_string();
        let created = tool::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name.trim().to_string()),
            serial_number: Set(serial.clone()),
            calibrated: Set(input.calibrated),
            description: Set(input.description.filter(|d| !d.is_empty())),
            current_location_id: Set(input.current_location_id),
            status: Set(input.status.unwrap_or(ToolStatus::Available)),
            assigned_to_id: Set(None),
            checked_out_date: Set(None),
            due_date: Set(None),
            last_checked_in: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|e| ServiceError::from_write(e, duplicate_serial(&serial)))?;

        info!(tool_id = %created.id, "Tool {} registered", created.serial_number);
        self.event_sender
            .send_or_log(Event::ToolCreated(created.id))
            .await;
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<tool::Model, ServiceError> {
        super::ensure_tool(self.db_pool.as_ref(), id).await
    }

    /// A tool with its current work center, if any
    #[instrument(skip(self))]
    pub async fn get_with_location(
        &self,
        id: Uuid,
    ) -> Result<(tool::Model, Option<work_center::Model>), ServiceError> {
        tool::Entity::find_by_id(id)
            .find_also_related(work_center::Entity)
            .one(self.db_pool.as_ref())
            .await?
            .ok_or_else(|| ServiceError::not_found("Tool", id))
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: ToolFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<(tool::Model, Option<work_center::Model>)>, u64), ServiceError> {
        let db = self.db_pool.as_ref();
        let mut condition = Condition::all();
        if let Some(status) = filter.status {
            condition = condition.add(tool::Column::Status.eq(status));
        }
        if let Some(calibrated) = filter.calibrated {
            condition = condition.add(tool::Column::Calibrated.eq(calibrated));
        }
        if let Some(location) = filter.location_id {
            condition = condition.add(tool::Column::CurrentLocationId.eq(location));
        }
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            condition = condition.add(
                Condition::any()
                    .add(super::contains_ignore_case(tool::Column::Name, search))
                    .add(super::contains_ignore_case(tool::Column::SerialNumber, search)),
            );
        }

        let total = tool::Entity::find()
            .filter(condition.clone())
            .count(db)
            .await?;

        let offset = page.saturating_sub(1) * limit;
        let rows = tool::Entity::find()
            .filter(condition)
            .order_by_asc(tool::Column::SerialNumber)
            .offset(offset)
            .limit(limit)
            .find_also_related(work_center::Entity)
            .all(db)
            .await?;

        Ok((rows, total))
    }

    /// Plain field edits. Status may move among the administrative states,
    /// but never into `checked_out`, and not at all while a checkout is open.
    #[instrument(skip(self))]
    pub async fn update(&self, id: Uuid, changes: UpdateTool) -> Result<tool::Model, ServiceError> {
        changes.validate()?;
        reject_checked_out(changes.status)?;
        let db = self.db_pool.as_ref();
        let existing = super::ensure_tool(db, id).await?;

        if let Some(status) = changes.status {
            if status != existing.status && existing.status == ToolStatus::CheckedOut {
                return Err(ServiceError::Conflict(format!(
                    "Tool {} ({}) is checked out; return it before changing its status",
                    existing.name, existing.serial_number
                )));
            }
        }
        if let Some(location) = changes.current_location_id {
            super::ensure_work_center(db, location).await?;
        }

        let serial = changes
            .serial_number
            .as_deref()
            .map(str::trim)
            .unwrap_or(&existing.serial_number)
            .to_string();

        let mut active: tool::ActiveModel = existing.into();
        if let Some(name) = changes.name {
            active.name = Set(name.trim().to_string());
        }
        if changes.serial_number.is_some() {
            active.serial_number = Set(serial.clone());
        }
        if let Some(calibrated) = changes.calibrated {
            active.calibrated = Set(calibrated);
        }
        if let Some(description) = changes.description {
            active.description = Set(Some(description).filter(|d| !d.is_empty()));
        }
        if let Some(location) = changes.current_location_id {
            active.current_location_id = Set(Some(location));
        }
        if let Some(status) = changes.status {
            active.status = Set(status);
        }

        let updated = active
            .update(db)
            .await
            .map_err(|e| ServiceError::from_write(e, duplicate_serial(&serial)))?;

        self.event_sender
            .send_or_log(Event::ToolUpdated(updated.id))
            .await;
        Ok(updated)
    }

    /// Moves a tool to a work center without going through a checkout
    #[instrument(skip(self))]
    pub async fn assign_to_location(
        &self,
        id: Uuid,
        location_id: Uuid,
    ) -> Result<tool::Model, ServiceError> {
        self.update(
            id,
            UpdateTool {
                current_location_id: Some(location_id),
                ..Default::default()
            },
        )
        .await
    }

    /// Deletes a tool together with its transactions and measurements
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        self.db_pool
            .transaction::<_, (), ServiceError>(move |txn| {
                Box::pin(async move {
                    super::ensure_tool(txn, id).await?;
                    tool_transaction::Entity::delete_many()
                        .filter(tool_transaction::Column::ToolId.eq(id))
                        .exec(txn)
                        .await?;
                    tool_measure::Entity::delete_many()
                        .filter(tool_measure::Column::ToolId.eq(id))
                        .exec(txn)
                        .await?;
                    tool::Entity::delete_by_id(id).exec(txn).await?;
                    Ok(())
                })
            })
            .await?;

        info!(tool_id = %id, "Tool deleted");
        self.event_sender.send_or_log(Event::ToolDeleted(id)).await;
        Ok(())
    }

    /// Checkout history of a tool, newest first
    #[instrument(skip(self))]
    pub async fn transactions(
        &self,
        id: Uuid,
    ) -> Result<Vec<tool_transaction::Model>, ServiceError> {
        let db = self.db_pool.as_ref();
        super::ensure_tool(db, id).await?;
        Ok(tool_transaction::Entity::find()
            .filter(tool_transaction::Column::ToolId.eq(id))
            .order_by_desc(tool_transaction::Column::CheckoutDate)
            .all(db)
            .await?)
    }
}

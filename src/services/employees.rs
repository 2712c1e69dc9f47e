use crate::{
    db::DbPool,
    entities::{employee, tool, tool_measure, tool_transaction, TransactionStatus},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::NaiveDate;
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
pub struct CreateEmployee {
    #[validate(length(min = 1, max = 50))]
    pub first_name: String,
    #[validate(length(max = 50))]
    #[serde(default)]
    pub last_name: String,
    #[validate(length(min = 1, max = 20, message = "Employee number must be between 1 and 20 characters"))]
    pub employee_number: String,
    #[validate(length(max = 100))]
    #[serde(default)]
    pub department: String,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    pub hire_date: Option<NaiveDate>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub primary_work_center_id: Option<Uuid>,
}

/// Partial update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateEmployee {
    #[validate(length(min = 1, max = 50))]
    pub first_name: Option<String>,
    #[validate(length(max = 50))]
    pub last_name: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub employee_number: Option<String>,
    #[validate(length(max = 100))]
    pub department: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub is_active: Option<bool>,
    pub primary_work_center_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct EmployeeFilter {
    pub active: Option<bool>,
    pub department: Option<String>,
    pub search: Option<String>,
}

fn default_true() -> bool {
    true
}

fn duplicate_number(number: &str) -> String {
    format!("Employee number '{}' is already in use", number)
}

/// Service for managing employees
#[derive(Clone)]
pub struct EmployeeService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl EmployeeService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self))]
    pub async fn create(&self, input: CreateEmployee) -> Result<employee::Model, ServiceError> {
        input.validate()?;
        let db = self.db_pool.as_ref();
        if let Some(wc) = input.primary_work_center_id {
            super::ensure_work_center(db, wc).await?;
        }

        let number = input.employee_number.trim().to_string();
        let created = employee::ActiveModel {
            id: Set(Uuid::new_v4()),
            first_name: Set(input.first_name.trim().to_string()),
            last_name: Set(input.last_name.trim().to_string()),
            employee_number: Set(number.clone()),
            department: Set(input.department),
            email: Set(input.email.filter(|e| !e.is_empty())),
            phone: Set(input.phone.filter(|p| !p.is_empty())),
            hire_date: Set(input.hire_date),
            is_active: Set(input.is_active),
            primary_work_center_id: Set(input.primary_work_center_id),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|e| ServiceError::from_write(e, duplicate_number(&number)))?;

        info!(employee_id = %created.id, "Employee {} created", created.display_name());
        self.event_sender
            .send_or_log(Event::EmployeeCreated(created.id))
            .await;
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<employee::Model, ServiceError> {
        super::ensure_employee(self.db_pool.as_ref(), id).await
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: EmployeeFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<employee::Model>, u64), ServiceError> {
        let db = self.db_pool.as_ref();
        let mut condition = Condition::all();
        if let Some(active) = filter.active {
            condition = condition.add(employee::Column::IsActive.eq(active));
        }
        if let Some(department) = filter.department.filter(|d| !d.is_empty()) {
            condition = condition.add(employee::Column::Department.eq(department));
        }
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            condition = condition.add(
                Condition::any()
                    .add(super::contains_ignore_case(employee::Column::FirstName, search))
                    .add(super::contains_ignore_case(employee::Column::LastName, search))
                    .add(super::contains_ignore_case(
                        employee::Column::EmployeeNumber,
                        search,
                    )),
            );
        }

        let total = employee::Entity::find()
            .filter(condition.clone())
            .count(db)
            .await?;

        let offset = page.saturating_sub(1) * limit;
        let rows = employee::Entity::find()
            .filter(condition)
            .order_by_asc(employee::Column::LastName)
            .order_by_asc(employee::Column::FirstName)
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
        changes: UpdateEmployee,
    ) -> Result<employee::Model, ServiceError> {
        changes.validate()?;
        let db = self.db_pool.as_ref();
        let existing = super::ensure_employee(db, id).await?;
        if let Some(wc) = changes.primary_work_center_id {
            super::ensure_work_center(db, wc).await?;
        }

        let number = changes
            .employee_number
            .as_deref()
            .map(str::trim)
            .unwrap_or(&existing.employee_number)
            .to_string();

        let mut active: employee::ActiveModel = existing.into();
        if let Some(first_name) = changes.first_name {
            active.first_name = Set(first_name.trim().to_string());
        }
        if let Some(last_name) = changes.last_name {
            active.last_name = Set(last_name.trim().to_string());
        }
        if changes.employee_number.is_some() {
            active.employee_number = Set(number.clone());
        }
        if let Some(department) = changes.department {
            active.department = Set(department);
        }
        if let Some(email) = changes.email {
            active.email = Set(Some(email).filter(|e| !e.is_empty()));
        }
        if let Some(phone) = changes.phone {
            active.phone = Set(Some(phone).filter(|p| !p.is_empty()));
        }
        if let Some(hire_date) = changes.hire_date {
            active.hire_date = Set(Some(hire_date));
        }
        if let Some(is_active) = changes.is_active {
            active.is_active = Set(is_active);
        }
        if let Some(wc) = changes.primary_work_center_id {
            active.primary_work_center_id = Set(Some(wc));
        }

        let updated = active
            .update(db)
            .await
            .map_err(|e| ServiceError::from_write(e, duplicate_number(&number)))?;

        self.event_sender
            .send_or_log(Event::EmployeeUpdated(updated.id))
            .await;
        Ok(updated)
    }

    /// Deletes an employee with their transaction and measurement history.
    /// Refused while the employee still holds a checked-out tool.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        self.db_pool
            .transaction::<_, (), ServiceError>(move |txn| {
                Box::pin(async move {
                    let employee = super::ensure_employee(txn, id).await?;

                    let open = tool_transaction::Entity::find()
                        .filter(tool_transaction::Column::EmployeeId.eq(id))
                        .filter(tool_transaction::Column::Status.eq(TransactionStatus::CheckedOut))
                        .count(txn)
                        .await?;
                    if open > 0 {
                        return Err(ServiceError::Conflict(format!(
                            "{} still has {} tool(s) checked out",
                            employee.display_name(),
                            open
                        )));
                    }

                    tool_transaction::Entity::update_many()
                        .col_expr(
                            tool_transaction::Column::ReturnEmployeeId,
                            Expr::value(None::<Uuid>),
                        )
                        .filter(tool_transaction::Column::ReturnEmployeeId.eq(id))
                        .exec(txn)
                        .await?;
                    tool::Entity::update_many()
                        .col_expr(tool::Column::AssignedToId, Expr::value(None::<Uuid>))
                        .filter(tool::Column::AssignedToId.eq(id))
                        .exec(txn)
                        .await?;
                    tool_transaction::Entity::delete_many()
                        .filter(tool_transaction::Column::EmployeeId.eq(id))
                        .exec(txn)
                        .await?;
                    tool_measure::Entity::delete_many()
                        .filter(tool_measure::Column::EmployeeId.eq(id))
                        .exec(txn)
                        .await?;

                    employee::Entity::delete_by_id(id).exec(txn).await?;
                    Ok(())
                })
            })
            .await?;

        info!(employee_id = %id, "Employee deleted");
        self.event_sender.send_or_log(Event::EmployeeDeleted(id)).await;
        Ok(())
    }

    /// The employee's checkout history, newest first
    #[instrument(skip(self))]
    pub async fn transactions(
        &self,
        id: Uuid,
    ) -> Result<Vec<tool_transaction::Model>, ServiceError> {
        let db = self.db_pool.as_ref();
        super::ensure_employee(db, id).await?;
        Ok(tool_transaction::Entity::find()
            .filter(tool_transaction::Column::EmployeeId.eq(id))
            .order_by_desc(tool_transaction::Column::CheckoutDate)
            .all(db)
            .await?)
    }
}

use crate::{
    commands::{
        tooltracker::{CheckOutToolCommand, CheckoutResult, ReturnResult, ReturnToolCommand},
        Command,
    },
    db::DbPool,
    entities::{employee, tool, tool_transaction, work_center, TransactionStatus},
    errors::ServiceError,
    events::EventSender,
};
use chrono::Utc;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

/// Serial fragments of this length or shorter never match
pub const LOOKUP_MIN_FRAGMENT_LEN: usize = 5;

/// Which transactions to list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TransactionScope {
    #[default]
    CheckedOut,
    Returned,
    All,
}

impl TransactionScope {
    fn status(self) -> Option<TransactionStatus> {
        match self {
            TransactionScope::CheckedOut => Some(TransactionStatus::CheckedOut),
            TransactionScope::Returned => Some(TransactionStatus::Returned),
            TransactionScope::All => None,
        }
    }
}

/// A transaction with the records it points at, for display
#[derive(Debug, Clone)]
pub struct TransactionDetails {
    pub transaction: tool_transaction::Model,
    pub tool: Option<tool::Model>,
    pub employee: Option<employee::Model>,
    pub return_employee: Option<employee::Model>,
    pub from_location: Option<work_center::Model>,
    pub to_location: Option<work_center::Model>,
}

/// Checkout/return lifecycle and the ledger queries built on it
#[derive(Clone)]
pub struct ToolTrackerService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl ToolTrackerService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self))]
    pub async fn check_out(
        &self,
        command: CheckOutToolCommand,
    ) -> Result<CheckoutResult, ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    #[instrument(skip(self))]
    pub async fn return_tool(
        &self,
        command: ReturnToolCommand,
    ) -> Result<ReturnResult, ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    #[instrument(skip(self))]
    pub async fn get_transaction(&self, id: Uuid) -> Result<TransactionDetails, ServiceError> {
        let transaction = tool_transaction::Entity::find_by_id(id)
            .one(self.db_pool.as_ref())
            .await?
            .ok_or_else(|| ServiceError::not_found("Transaction", id))?;
        let mut details = self.with_details(vec![transaction]).await?;
        details
            .pop()
            .ok_or_else(|| ServiceError::not_found("Transaction", id))
    }

    /// Transactions in `scope`, most recent checkout first
    #[instrument(skip(self))]
    pub async fn list_transactions(
        &self,
        scope: TransactionScope,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<TransactionDetails>, u64), ServiceError> {
        let db = self.db_pool.as_ref();
        let mut query = tool_transaction::Entity::find();
        if let Some(status) = scope.status() {
            query = query.filter(tool_transaction::Column::Status.eq(status));
        }

        let total = query.clone().count(db).await?;
        let offset = page.saturating_sub(1) * limit;
        let rows = query
            .order_by_desc(tool_transaction::Column::CheckoutDate)
            .offset(offset)
            .limit(limit)
            .all(db)
            .await?;

        Ok((self.with_details(rows).await?, total))
    }

    /// Open transactions of `employee_id` whose promised return date has passed
    #[instrument(skip(self))]
    pub async fn overdue_tools(
        &self,
        employee_id: Uuid,
    ) -> Result<Vec<TransactionDetails>, ServiceError> {
        let db = self.db_pool.as_ref();
        super::ensure_employee(db, employee_id).await?;

        let today = Utc::now().date_naive();
        let rows = tool_transaction::Entity::find()
            .filter(tool_transaction::Column::EmployeeId.eq(employee_id))
            .filter(tool_transaction::Column::Status.eq(TransactionStatus::CheckedOut))
            .filter(tool_transaction::Column::ExpectedReturnDate.lt(today))
            .order_by_asc(tool_transaction::Column::ExpectedReturnDate)
            .all(db)
            .await?
            .into_iter()
            .filter(|txn| txn.is_overdue_at(today))
            .collect();

        self.with_details(rows).await
    }

    /// Name of the current work center of the first tool (by serial number)
    /// whose serial contains `fragment`, ignoring case. Empty when the
    /// fragment is too short, nothing matches, or the tool has no location.
    #[instrument(skip(self))]
    pub async fn lookup_work_center(&self, fragment: &str) -> Result<String, ServiceError> {
        let fragment = fragment.trim();
        if fragment.chars().count() <= LOOKUP_MIN_FRAGMENT_LEN {
            debug!("Serial fragment too short for lookup");
            return Ok(String::new());
        }

        let found = tool::Entity::find()
            .filter(super::contains_ignore_case(tool::Column::SerialNumber, fragment))
            .order_by_asc(tool::Column::SerialNumber)
            .find_also_related(work_center::Entity)
            .one(self.db_pool.as_ref())
            .await?;

        Ok(found
            .and_then(|(_, location)| location)
            .map(|wc| wc.name)
            .unwrap_or_default())
    }

    async fn with_details(
        &self,
        rows: Vec<tool_transaction::Model>,
    ) -> Result<Vec<TransactionDetails>, ServiceError> {
        let db = self.db_pool.as_ref();
        let tools = super::load_tools(db, rows.iter().map(|t| t.tool_id)).await?;
        let employees = super::load_employees(
            db,
            rows.iter()
                .flat_map(|t| std::iter::once(t.employee_id).chain(t.return_employee_id)),
        )
        .await?;
        let locations = super::load_work_centers(
            db,
            rows.iter()
                .flat_map(|t| t.from_location_id.into_iter().chain(t.to_location_id)),
        )
        .await?;

        Ok(rows
            .into_iter()
            .map(|transaction| TransactionDetails {
                tool: tools.get(&transaction.tool_id).cloned(),
                employee: employees.get(&transaction.employee_id).cloned(),
                return_employee: transaction
                    .return_employee_id
                    .and_then(|id| employees.get(&id).cloned()),
                from_location: transaction
                    .from_location_id
                    .and_then(|id| locations.get(&id).cloned()),
                to_location: transaction
                    .to_location_id
                    .and_then(|id| locations.get(&id).cloned()),
                transaction,
            })
            .collect())
    }
}

use crate::{
    commands::Command,
    db::DbPool,
    entities::{
        tool::{self, ToolStatus},
        tool_transaction,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    repositories::{ToolRepository, ToolStore},
};
use chrono::{DateTime, Utc};
use metrics::counter;
use sea_orm::{Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Closes an open checkout and puts the tool back into service.
///
/// The tool goes back to the transaction's source work center, not to the
/// destination it was checked out to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnToolCommand {
    pub transaction_id: Uuid,
    pub returned_by: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReturnResult {
    pub tool: tool::Model,
    pub transaction: tool_transaction::Model,
}

#[async_trait::async_trait]
impl Command for ReturnToolCommand {
    type Result = ReturnResult;

    #[instrument(skip(self, db_pool, event_sender), fields(transaction_id = %self.transaction_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let command = self.clone();
        let now = Utc::now();
        let result = db_pool
            .transaction::<_, ReturnResult, ServiceError>(move |txn| {
                Box::pin(async move {
                    let store = ToolRepository::new(txn);
                    command.return_tool(&store, now).await
                })
            })
            .await
            .map_err(ServiceError::from)
            .map_err(|err| {
                warn!(error = %err, "Return rejected");
                err
            })?;

        counter!("tooltrack.returns", 1);
        info!(
            tool_id = %result.tool.id,
            returned_to = ?result.tool.current_location_id,
            "Tool {} returned",
            result.tool.serial_number
        );

        event_sender
            .send_or_log(Event::ToolReturned {
                tool_id: result.tool.id,
                transaction_id: result.transaction.id,
                returned_by: result.transaction.return_employee_id,
                returned_to_location_id: result.tool.current_location_id,
                returned_at: now,
            })
            .await;

        Ok(result)
    }
}

impl ReturnToolCommand {
    pub async fn return_tool<S: ToolStore>(
        &self,
        store: &S,
        now: DateTime<Utc>,
    ) -> Result<ReturnResult, ServiceError> {
        // Close first so the transaction holds the write lock before any read.
        let Some(mut transaction) = store.close_transaction(self.transaction_id, now).await? else {
            return Err(match store.get_transaction(self.transaction_id).await? {
                Some(_) => self.already_returned(),
                None => ServiceError::not_found("Transaction", self.transaction_id),
            });
        };

        if let Some(employee_id) = self.returned_by {
            if !store.employee_exists(employee_id).await? {
                return Err(ServiceError::not_found("Employee", employee_id));
            }
            let mut closed: tool_transaction::ActiveModel = transaction.into();
            closed.return_employee_id = Set(Some(employee_id));
            transaction = store.save_transaction(closed).await?;
        }

        let tool = store
            .get_tool(transaction.tool_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Tool", transaction.tool_id))?;

        let mut tool: tool::ActiveModel = tool.into();
        tool.status = Set(ToolStatus::Available);
        tool.assigned_to_id = Set(None);
        tool.current_location_id = Set(transaction.from_location_id);
        tool.checked_out_date = Set(None);
        tool.due_date = Set(None);
        tool.last_checked_in = Set(Some(now));
        let tool = store.save_tool(tool).await?;

        Ok(ReturnResult { tool, transaction })
    }

    fn already_returned(&self) -> ServiceError {
        ServiceError::NotFound(format!(
            "Transaction {} has already been returned",
            self.transaction_id
        ))
    }
}

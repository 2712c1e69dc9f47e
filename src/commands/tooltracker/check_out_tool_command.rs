use crate::{
    commands::Command,
    db::DbPool,
    entities::{
        tool::{self, ToolStatus},
        tool_transaction::{self, TransactionStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    repositories::{ToolRepository, ToolStore},
};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use metrics::counter;
use sea_orm::{Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

/// Assigns an available tool to an employee and moves it to a work center
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CheckOutToolCommand {
    pub tool_id: Uuid,
    pub employee_id: Uuid,
    pub to_location_id: Uuid,
    pub expected_return_date: Option<NaiveDate>,
    #[validate(length(max = 1000, message = "Notes cannot exceed 1000 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutResult {
    pub tool: tool::Model,
    pub transaction: tool_transaction::Model,
}

#[async_trait::async_trait]
impl Command for CheckOutToolCommand {
    type Result = CheckoutResult;

    #[instrument(skip(self, db_pool, event_sender), fields(tool_id = %self.tool_id, employee_id = %self.employee_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()?;

        let command = self.clone();
        let now = Utc::now();
        let outcome = db_pool
            .transaction::<_, CheckoutResult, ServiceError>(move |txn| {
                Box::pin(async move {
                    let store = ToolRepository::new(txn);
                    command.check_out(&store, now).await
                })
            })
            .await
            .map_err(ServiceError::from);

        let result = match outcome {
            Ok(result) => result,
            Err(err) => {
                if matches!(err, ServiceError::Conflict(_)) {
                    counter!("tooltrack.checkout.conflicts", 1);
                }
                warn!(error = %err, "Checkout rejected");
                return Err(err);
            }
        };

        counter!("tooltrack.checkouts", 1);
        info!(
            transaction_id = %result.transaction.id,
            to_location_id = %self.to_location_id,
            "Tool {} checked out",
            result.tool.serial_number
        );

        event_sender
            .send_or_log(Event::ToolCheckedOut {
                tool_id: result.tool.id,
                transaction_id: result.transaction.id,
                employee_id: result.transaction.employee_id,
                to_location_id: result.transaction.to_location_id,
                checked_out_at: result.transaction.checkout_date,
            })
            .await;

        Ok(result)
    }
}

impl CheckOutToolCommand {
    /// Runs the checkout against `store`. Callers provide a store bound to a
    /// single database transaction.
    ///
    /// The guarded claim must stay the first statement: the transaction has to
    /// hold the write lock before it reads anything.
    pub async fn check_out<S: ToolStore>(
        &self,
        store: &S,
        now: DateTime<Utc>,
    ) -> Result<CheckoutResult, ServiceError> {
        if !store.claim_tool(self.tool_id, now).await? {
            let tool = store
                .get_tool(self.tool_id)
                .await?
                .ok_or_else(|| ServiceError::not_found("Tool", self.tool_id))?;
            return Err(ServiceError::Conflict(unavailable_message(&tool)));
        }

        if !store.employee_exists(self.employee_id).await? {
            return Err(ServiceError::not_found("Employee", self.employee_id));
        }
        if !store.work_center_exists(self.to_location_id).await? {
            return Err(ServiceError::not_found("Work center", self.to_location_id));
        }

        let tool = store
            .get_tool(self.tool_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Tool", self.tool_id))?;

        if let Some(open) = store.get_open_transaction_for(tool.id).await? {
            return Err(ServiceError::Conflict(format!(
                "Tool {} ({}) already has open transaction {}",
                tool.name, tool.serial_number, open.id
            )));
        }

        let from_location_id = tool.current_location_id;
        let mut assigned: tool::ActiveModel = tool.into();
        assigned.assigned_to_id = Set(Some(self.employee_id));
        assigned.current_location_id = Set(Some(self.to_location_id));
        assigned.due_date = Set(self.expected_return_date.and_then(start_of_day_utc));
        let tool = store.save_tool(assigned).await?;

        let transaction = store
            .create_transaction(tool_transaction::ActiveModel {
                id: Set(Uuid::new_v4()),
                tool_id: Set(tool.id),
                employee_id: Set(self.employee_id),
                from_location_id: Set(from_location_id),
                to_location_id: Set(Some(self.to_location_id)),
                checkout_date: Set(now),
                expected_return_date: Set(self.expected_return_date),
                return_date: Set(None),
                return_employee_id: Set(None),
                status: Set(TransactionStatus::CheckedOut),
                notes: Set(self.notes.clone().unwrap_or_default()),
                ..Default::default()
            })
            .await?;

        Ok(CheckoutResult { tool, transaction })
    }
}

fn unavailable_message(tool: &tool::Model) -> String {
    match tool.status {
        ToolStatus::CheckedOut => format!(
            "Tool {} ({}) is already checked out",
            tool.name, tool.serial_number
        ),
        other => format!(
            "Tool {} ({}) is {} and cannot be checked out",
            tool.name,
            tool.serial_number,
            other.label().to_lowercase()
        ),
    }
}

fn start_of_day_utc(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0)
        .map(|midnight| Utc.from_utc_datetime(&midnight))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn promised_date_becomes_midnight_utc() {
        let due = start_of_day_utc(NaiveDate::from_ymd_opt(2024, 5, 17).unwrap()).unwrap();
        assert_eq!(due.to_rfc3339(), "2024-05-17T00:00:00+00:00");
    }

    #[test]
    fn notes_length_is_validated() {
        let command = CheckOutToolCommand {
            tool_id: Uuid::new_v4(),
            employee_id: Uuid::new_v4(),
            to_location_id: Uuid::new_v4(),
            expected_return_date: None,
            notes: Some("x".repeat(1001)),
        };
        assert!(command.validate().is_err());
    }
}

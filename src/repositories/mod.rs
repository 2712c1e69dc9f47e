use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::entities::{
    employee, tool,
    tool_transaction::{self, TransactionStatus},
    work_center, ToolStatus,
};
use crate::errors::ServiceError;

/// Everything the checkout/return commands need from persistence.
///
/// Implementations are bound to a single connection or open transaction, so
/// a command sees one consistent view of the ledger for its whole run.
#[async_trait]
pub trait ToolStore: Send + Sync {
    async fn get_tool(&self, id: Uuid) -> Result<Option<tool::Model>, ServiceError>;

    async fn save_tool(&self, tool: tool::ActiveModel) -> Result<tool::Model, ServiceError>;

    /// Atomically moves an `Available` tool to `CheckedOut`. Returns `false`
    /// when the tool is missing or was not available at the moment of the
    /// write. Assignment and location are set afterwards with [`save_tool`].
    ///
    /// [`save_tool`]: ToolStore::save_tool
    async fn claim_tool(&self, tool_id: Uuid, at: DateTime<Utc>) -> Result<bool, ServiceError>;

    async fn get_transaction(
        &self,
        id: Uuid,
    ) -> Result<Option<tool_transaction::Model>, ServiceError>;

    async fn get_open_transaction_for(
        &self,
        tool_id: Uuid,
    ) -> Result<Option<tool_transaction::Model>, ServiceError>;

    async fn create_transaction(
        &self,
        txn: tool_transaction::ActiveModel,
    ) -> Result<tool_transaction::Model, ServiceError>;

    /// Marks an open transaction returned. `None` when it was not open.
    async fn close_transaction(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Option<tool_transaction::Model>, ServiceError>;

    async fn save_transaction(
        &self,
        txn: tool_transaction::ActiveModel,
    ) -> Result<tool_transaction::Model, ServiceError>;

    async fn employee_exists(&self, id: Uuid) -> Result<bool, ServiceError>;

    async fn work_center_exists(&self, id: Uuid) -> Result<bool, ServiceError>;
}

/// sea-orm backed [`ToolStore`] over any connection or transaction
#[derive(Debug)]
pub struct ToolRepository<'c, C> {
    conn: &'c C,
}

impl<'c, C> ToolRepository<'c, C>
where
    C: ConnectionTrait,
{
    pub fn new(conn: &'c C) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl<'c, C> ToolStore for ToolRepository<'c, C>
where
    C: ConnectionTrait + Send + Sync,
{
    async fn get_tool(&self, id: Uuid) -> Result<Option<tool::Model>, ServiceError> {
        Ok(tool::Entity::find_by_id(id).one(self.conn).await?)
    }

    async fn save_tool(&self, tool: tool::ActiveModel) -> Result<tool::Model, ServiceError> {
        Ok(tool.update(self.conn).await?)
    }

    async fn claim_tool(&self, tool_id: Uuid, at: DateTime<Utc>) -> Result<bool, ServiceError> {
        let result = tool::Entity::update_many()
            .set(tool::ActiveModel {
                status: Set(ToolStatus::CheckedOut),
                checked_out_date: Set(Some(at)),
                updated_at: Set(Some(at)),
                ..Default::default()
            })
            .filter(tool::Column::Id.eq(tool_id))
            .filter(tool::Column::Status.eq(ToolStatus::Available))
            .exec(self.conn)
            .await?;

        Ok(result.rows_affected == 1)
    }

    async fn get_transaction(
        &self,
        id: Uuid,
    ) -> Result<Option<tool_transaction::Model>, ServiceError> {
        Ok(tool_transaction::Entity::find_by_id(id)
            .one(self.conn)
            .await?)
    }

    async fn get_open_transaction_for(
        &self,
        tool_id: Uuid,
    ) -> Result<Option<tool_transaction::Model>, ServiceError> {
        Ok(tool_transaction::Entity::find()
            .filter(tool_transaction::Column::ToolId.eq(tool_id))
            .filter(tool_transaction::Column::Status.eq(TransactionStatus::CheckedOut))
            .one(self.conn)
            .await?)
    }

    async fn create_transaction(
        &self,
        txn: tool_transaction::ActiveModel,
    ) -> Result<tool_transaction::Model, ServiceError> {
        txn.insert(self.conn).await.map_err(|e| {
            ServiceError::from_write(e, "Tool already has an open checkout transaction")
        })
    }

    async fn close_transaction(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Option<tool_transaction::Model>, ServiceError> {
        let result = tool_transaction::Entity::update_many()
            .set(tool_transaction::ActiveModel {
                status: Set(TransactionStatus::Returned),
                return_date: Set(Some(at)),
                updated_at: Set(Some(at)),
                ..Default::default()
            })
            .filter(tool_transaction::Column::Id.eq(id))
            .filter(tool_transaction::Column::Status.eq(TransactionStatus::CheckedOut))
            .exec(self.conn)
            .await?;

        if result.rows_affected == 0 {
            return Ok(None);
        }
        self.get_transaction(id).await
    }

    async fn save_transaction(
        &self,
        txn: tool_transaction::ActiveModel,
    ) -> Result<tool_transaction::Model, ServiceError> {
        Ok(txn.update(self.conn).await?)
    }

    async fn employee_exists(&self, id: Uuid) -> Result<bool, ServiceError> {
        let count = employee::Entity::find()
            .filter(employee::Column::Id.eq(id))
            .count(self.conn)
            .await?;
        Ok(count > 0)
    }

    async fn work_center_exists(&self, id: Uuid) -> Result<bool, ServiceError> {
        let count = work_center::Entity::find()
            .filter(work_center::Column::Id.eq(id))
            .count(self.conn)
            .await?;
        Ok(count > 0)
    }
}

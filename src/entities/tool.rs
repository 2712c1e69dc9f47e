use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{entity::prelude::*, ActiveValue::Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Availability of a tool. Only the checkout/return commands move a tool in
/// and out of `CheckedOut`; the other states are plain administrative edits.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    #[sea_orm(string_value = "available")]
    Available,
    #[sea_orm(string_value = "checked_out")]
    CheckedOut,
    #[sea_orm(string_value = "in_maintenance")]
    InMaintenance,
    #[sea_orm(string_value = "in_calibration")]
    InCalibration,
}

impl ToolStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ToolStatus::Available => "Available",
            ToolStatus::CheckedOut => "Checked Out",
            ToolStatus::InMaintenance => "In Maintenance",
            ToolStatus::InCalibration => "In Calibration",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tools")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub serial_number: String,
    pub calibrated: bool,
    pub description: Option<String>,
    pub current_location_id: Option<Uuid>,
    pub status: ToolStatus,
    pub assigned_to_id: Option<Uuid>,
    pub checked_out_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub last_checked_in: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    pub fn is_available(&self) -> bool {
        self.status == ToolStatus::Available
    }

    pub fn calibration_status(&self) -> &'static str {
        if self.calibrated {
            "Calibrated"
        } else {
            "Requires Calibration"
        }
    }

    /// `assigned_to` and `checked_out_date` are set together, and only while checked out
    pub fn assignment_is_consistent(&self) -> bool {
        match (self.assigned_to_id, self.checked_out_date) {
            (Some(_), Some(_)) => self.status == ToolStatus::CheckedOut,
            (None, None) => self.status != ToolStatus::CheckedOut,
            _ => false,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::work_center::Entity",
        from = "Column::CurrentLocationId",
        to = "super::work_center::Column::Id",
        on_delete = "SetNull"
    )]
    CurrentLocation,
    #[sea_orm(
        belongs_to = "super::employee::Entity",
        from = "Column::AssignedToId",
        to = "super::employee::Column::Id",
        on_delete = "SetNull"
    )]
    AssignedTo,
    #[sea_orm(has_many = "super::tool_transaction::Entity")]
    Transactions,
    #[sea_orm(has_many = "super::tool_measure::Entity")]
    Measures,
}

impl Related<super::work_center::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CurrentLocation.def()
    }
}

impl Related<super::employee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AssignedTo.def()
    }
}

impl Related<super::tool_transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::tool_measure::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Measures.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        let now = Utc::now();

        if insert {
            active_model.created_at = Set(now);
        }
        active_model.updated_at = Set(Some(now));

        Ok(active_model)
    }
}

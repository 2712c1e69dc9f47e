use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{entity::prelude::*, ActiveValue::Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Sizes are recorded to four decimal places
pub const SIZE_SCALE: u32 = 4;

/// Largest magnitude a `decimal(10, 4)` size column holds
pub const SIZE_LIMIT: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum MeasureCondition {
    #[default]
    #[sea_orm(string_value = "good")]
    Good,
    #[sea_orm(string_value = "fair")]
    Fair,
    #[sea_orm(string_value = "poor")]
    Poor,
    #[sea_orm(string_value = "needs_repair")]
    NeedsRepair,
}

impl MeasureCondition {
    pub fn label(&self) -> &'static str {
        match self {
            MeasureCondition::Good => "Good",
            MeasureCondition::Fair => "Fair",
            MeasureCondition::Poor => "Poor",
            MeasureCondition::NeedsRepair => "Needs Repair",
        }
    }
}

/// Rounds a size to the recorded scale. `None` when it does not fit the column.
pub fn round_size(value: Decimal) -> Option<Decimal> {
    let mut rounded = value.round_dp(SIZE_SCALE);
    rounded.rescale(SIZE_SCALE);
    (rounded.abs() < SIZE_LIMIT).then_some(rounded)
}

/// A single calibration measurement of a tool
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tool_measures")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tool_id: Uuid,
    pub employee_id: Uuid,
    pub work_center_id: Option<Uuid>,
    pub measurement_date: DateTime<Utc>,
    #[sea_orm(column_type = "Decimal(Some((10, 4)))")]
    pub size_measured: Decimal,
    #[sea_orm(column_type = "Decimal(Some((10, 4)))", nullable)]
    pub expected_size: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((10, 4)))", nullable)]
    pub tolerance: Option<Decimal>,
    pub condition: MeasureCondition,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    /// `|measured - expected| <= tolerance`; `None` unless both expected size
    /// and tolerance were recorded.
    pub fn is_within_tolerance(&self) -> Option<bool> {
        let variance = self.variance()?;
        let tolerance = self.tolerance?.round_dp(SIZE_SCALE);
        Some(variance.abs() <= tolerance)
    }

    /// `measured - expected`, when an expected size was recorded
    pub fn variance(&self) -> Option<Decimal> {
        let expected = self.expected_size?.round_dp(SIZE_SCALE);
        Some(self.size_measured.round_dp(SIZE_SCALE) - expected)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tool::Entity",
        from = "Column::ToolId",
        to = "super::tool::Column::Id",
        on_delete = "Cascade"
    )]
    Tool,
    #[sea_orm(
        belongs_to = "super::employee::Entity",
        from = "Column::EmployeeId",
        to = "super::employee::Column::Id",
        on_delete = "Cascade"
    )]
    Employee,
    #[sea_orm(
        belongs_to = "super::work_center::Entity",
        from = "Column::WorkCenterId",
        to = "super::work_center::Column::Id",
        on_delete = "SetNull"
    )]
    WorkCenter,
}

impl Related<super::tool::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tool.def()
    }
}

impl Related<super::employee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employee.def()
    }
}

impl Related<super::work_center::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WorkCenter.def()
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

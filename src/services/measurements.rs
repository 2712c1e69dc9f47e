use crate::{
    db::DbPool,
    entities::{
        employee,
        tool,
        tool_measure::{self, round_size, MeasureCondition},
        work_center,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Column headings of the CSV export, in order
pub const EXPORT_HEADERS: [&str; 10] = [
    "Date",
    "Tool",
    "Serial Number",
    "Employee",
    "Work Center",
    "Size Measured",
    "Expected Size",
    "Tolerance",
    "Condition",
    "Notes",
];

const NOT_APPLICABLE: &str = "N/A";

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateMeasurement {
    pub tool_id: Uuid,
    pub employee_id: Uuid,
    pub work_center_id: Option<Uuid>,
    /// Defaults to the time of the request
    pub measurement_date: Option<DateTime<Utc>>,
    pub size_measured: Decimal,
    pub expected_size: Option<Decimal>,
    pub tolerance: Option<Decimal>,
    #[serde(default)]
    pub condition: MeasureCondition,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub notes: String,
}

/// A measurement with the records it points at
#[derive(Debug, Clone)]
pub struct MeasurementDetails {
    pub measure: tool_measure::Model,
    pub tool: Option<tool::Model>,
    pub employee: Option<employee::Model>,
    pub work_center: Option<work_center::Model>,
}

/// Service for recording and reporting calibration measurements
#[derive(Clone)]
pub struct MeasurementService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl MeasurementService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self))]
    pub async fn create(
        &self,
        input: CreateMeasurement,
    ) -> Result<MeasurementDetails, ServiceError> {
        input.validate()?;
        let db = self.db_pool.as_ref();
        let tool = super::ensure_tool(db, input.tool_id).await?;
        let employee = super::ensure_employee(db, input.employee_id).await?;
        let work_center = match input.work_center_id {
            Some(id) => Some(super::ensure_work_center(db, id).await?),
            None => None,
        };

        let size_measured = checked_size("size_measured", input.size_measured)?;
        let expected_size = input
            .expected_size
            .map(|size| checked_size("expected_size", size))
            .transpose()?;
        let tolerance = input
            .tolerance
            .map(|size| checked_size("tolerance", size))
            .transpose()?;
        if tolerance.is_some_and(|t| t < Decimal::ZERO) {
            return Err(ServiceError::ValidationError(
                "Tolerance cannot be negative".to_string(),
            ));
        }

        let measure = tool_measure::ActiveModel {
            id: Set(Uuid::new_v4()),
            tool_id: Set(tool.id),
            employee_id: Set(employee.id),
            work_center_id: Set(input.work_center_id),
            measurement_date: Set(input.measurement_date.unwrap_or_else(Utc::now)),
            size_measured: Set(size_measured),
            expected_size: Set(expected_size),
            tolerance: Set(tolerance),
            condition: Set(input.condition),
            notes: Set(input.notes),
            ..Default::default()
        }
        .insert(db)
        .await?;

        info!(
            measure_id = %measure.id,
            within_tolerance = ?measure.is_within_tolerance(),
            "Measurement recorded for tool {}",
            tool.serial_number
        );
        self.event_sender
            .send_or_log(Event::MeasurementRecorded {
                measure_id: measure.id,
                tool_id: tool.id,
                within_tolerance: measure.is_within_tolerance(),
            })
            .await;

        Ok(MeasurementDetails {
            measure,
            tool: Some(tool),
            employee: Some(employee),
            work_center,
        })
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<MeasurementDetails, ServiceError> {
        let measure = tool_measure::Entity::find_by_id(id)
            .one(self.db_pool.as_ref())
            .await?
            .ok_or_else(|| ServiceError::not_found("Measurement", id))?;
        let mut details = self.with_details(vec![measure]).await?;
        details
            .pop()
            .ok_or_else(|| ServiceError::not_found("Measurement", id))
    }

    /// Measurement history, newest first, optionally for a single tool
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        tool_id: Option<Uuid>,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<MeasurementDetails>, u64), ServiceError> {
        let db = self.db_pool.as_ref();
        let mut query = tool_measure::Entity::find();
        if let Some(tool_id) = tool_id {
            query = query.filter(tool_measure::Column::ToolId.eq(tool_id));
        }

        let total = query.clone().count(db).await?;
        let offset = page.saturating_sub(1) * limit;
        let rows = query
            .order_by_desc(tool_measure::Column::MeasurementDate)
            .offset(offset)
            .limit(limit)
            .all(db)
            .await?;

        Ok((self.with_details(rows).await?, total))
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = tool_measure::Entity::delete_by_id(id)
            .exec(self.db_pool.as_ref())
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::not_found("Measurement", id));
        }

        self.event_sender
            .send_or_log(Event::MeasurementDeleted(id))
            .await;
        Ok(())
    }

    /// Every measurement as CSV, newest first
    #[instrument(skip(self))]
    pub async fn export_csv(&self) -> Result<Vec<u8>, ServiceError> {
        let rows = tool_measure::Entity::find()
            .order_by_desc(tool_measure::Column::MeasurementDate)
            .all(self.db_pool.as_ref())
            .await?;
        let details = self.with_details(rows).await?;

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(EXPORT_HEADERS)?;
        for row in &details {
            writer.write_record(export_record(row))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| ServiceError::SerializationError(e.to_string()))?;
        info!(rows = details.len(), "Measurements exported");
        Ok(bytes)
    }

    async fn with_details(
        &self,
        rows: Vec<tool_measure::Model>,
    ) -> Result<Vec<MeasurementDetails>, ServiceError> {
        let db = self.db_pool.as_ref();
        let tools = super::load_tools(db, rows.iter().map(|m| m.tool_id)).await?;
        let employees = super::load_employees(db, rows.iter().map(|m| m.employee_id)).await?;
        let work_centers =
            super::load_work_centers(db, rows.iter().filter_map(|m| m.work_center_id)).await?;

        Ok(rows
            .into_iter()
            .map(|measure| MeasurementDetails {
                tool: tools.get(&measure.tool_id).cloned(),
                employee: employees.get(&measure.employee_id).cloned(),
                work_center: measure
                    .work_center_id
                    .and_then(|id| work_centers.get(&id).cloned()),
                measure,
            })
            .collect())
    }
}

fn checked_size(field: &str, value: Decimal) -> Result<Decimal, ServiceError> {
    round_size(value).ok_or_else(|| {
        ServiceError::ValidationError(format!(
            "{} must be smaller than {} in magnitude",
            field,
            tool_measure::SIZE_LIMIT
        ))
    })
}

fn format_size(value: Decimal) -> String {
    format!("{:.4}", value)
}

fn export_record(row: &MeasurementDetails) -> [String; 10] {
    let measure = &row.measure;
    [
        measure.measurement_date.format("%m/%d/%Y").to_string(),
        row.tool.as_ref().map(|t| t.name.clone()).unwrap_or_default(),
        row.tool
            .as_ref()
            .map(|t| t.serial_number.clone())
            .unwrap_or_default(),
        row.employee
            .as_ref()
            .map(|e| e.full_name())
            .unwrap_or_default(),
        row.work_center
            .as_ref()
            .map(|w| w.name.clone())
            .unwrap_or_else(|| NOT_APPLICABLE.to_string()),
        format_size(measure.size_measured),
        measure
            .expected_size
            .map(format_size)
            .unwrap_or_else(|| NOT_APPLICABLE.to_string()),
        measure
            .tolerance
            .map(format_size)
            .unwrap_or_else(|| NOT_APPLICABLE.to_string()),
        measure.condition.label().to_string(),
        measure.notes.clone(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn export_record_fills_missing_values_with_na() {
        let measure = tool_measure::Model {
            id: Uuid::new_v4(),
            tool_id: Uuid::new_v4(),
            employee_id: Uuid::new_v4(),
            work_center_id: None,
            measurement_date: Utc.with_ymd_and_hms(2024, 2, 9, 14, 0, 0).unwrap(),
            size_measured: dec!(12.5),
            expected_size: None,
            tolerance: None,
            condition: MeasureCondition::NeedsRepair,
            notes: "chipped jaw".into(),
            created_at: Utc::now(),
            updated_at: None,
        };
        let row = MeasurementDetails {
            measure,
            tool: None,
            employee: None,
            work_center: None,
        };

        let record = export_record(&row);
        assert_eq!(record[0], "02/09/2024");
        assert_eq!(record[4], "N/A");
        assert_eq!(record[5], "12.5000");
        assert_eq!(record[6], "N/A");
        assert_eq!(record[7], "N/A");
        assert_eq!(record[8], "Needs Repair");
        assert_eq!(record[9], "chipped jaw");
    }

    #[test]
    fn oversized_values_are_rejected_for_every_size_field() {
        for field in ["size_measured", "expected_size", "tolerance"] {
            let err = checked_size(field, dec!(1234567.5)).unwrap_err();
            assert!(
                matches!(err, ServiceError::ValidationError(ref m) if m.starts_with(field)),
                "{field}: {err:?}"
            );
        }
        assert_eq!(checked_size("tolerance", dec!(0.00049)).unwrap(), dec!(0.0005));
    }
}

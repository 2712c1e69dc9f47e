use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{entity::prelude::*, ActiveValue::Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    #[sea_orm(string_value = "checked_out")]
    CheckedOut,
    #[sea_orm(string_value = "returned")]
    Returned,
}

/// One checkout-to-return cycle of a tool
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tool_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tool_id: Uuid,
    pub employee_id: Uuid,
    pub from_location_id: Option<Uuid>,
    pub to_location_id: Option<Uuid>,
    pub checkout_date: DateTime<Utc>,
    pub expected_return_date: Option<NaiveDate>,
    pub return_date: Option<DateTime<Utc>>,
    pub return_employee_id: Option<Uuid>,
    pub status: TransactionStatus,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    pub fn is_open(&self) -> bool {
        self.status == TransactionStatus::CheckedOut
    }

    /// Open and promised back before `today`
    pub fn is_overdue_at(&self, today: NaiveDate) -> bool {
        self.is_open()
            && self
                .expected_return_date
                .map(|promised| promised < today)
                .unwrap_or(false)
    }

    pub fn is_overdue(&self) -> bool {
        self.is_overdue_at(Utc::now().date_naive())
    }

    /// Whole calendar days between checkout and return, or `now` while still out
    pub fn days_out_at(&self, now: DateTime<Utc>) -> i64 {
        let end = match self.return_date {
            Some(returned) if !self.is_open() => returned.date_naive(),
            _ => now.date_naive(),
        };
        (end - self.checkout_date.date_naive()).num_days()
    }

    pub fn days_out(&self) -> i64 {
        self.days_out_at(Utc::now())
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
        belongs_to = "super::employee::Entity",
        from = "Column::ReturnEmployeeId",
        to = "super::employee::Column::Id",
        on_delete = "SetNull"
    )]
    ReturnEmployee,
    #[sea_orm(
        belongs_to = "super::work_center::Entity",
        from = "Column::FromLocationId",
        to = "super::work_center::Column::Id",
        on_delete = "SetNull"
    )]
    FromLocation,
    #[sea_orm(
        belongs_to = "super::work_center::Entity",
        from = "Column::ToLocationId",
        to = "super::work_center::Column::Id",
        on_delete = "SetNull"
    )]
    ToLocation,
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

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rstest::rstest;

    fn open_transaction(checkout_date: DateTime<Utc>, due: Option<NaiveDate>) -> Model {
        Model {
            id: Uuid::new_v4(),
            tool_id: Uuid::new_v4(),
            employee_id: Uuid::new_v4(),
            from_location_id: None,
            to_location_id: Some(Uuid::new_v4()),
            checkout_date,
            expected_return_date: due,
            return_date: None,
            return_employee_id: None,
            status: TransactionStatus::CheckedOut,
            notes: String::new(),
            created_at: checkout_date,
            updated_at: None,
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case(Some(day(2024, 3, 9)), true)]
    #[case(Some(day(2024, 3, 10)), false)]
    #[case(Some(day(2024, 3, 11)), false)]
    #[case(None, false)]
    fn overdue_only_when_promised_date_has_passed(
        #[case] due: Option<NaiveDate>,
        #[case] expected: bool,
    ) {
        let checkout = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let txn = open_transaction(checkout, due);
        assert_eq!(txn.is_overdue_at(day(2024, 3, 10)), expected);
    }

    #[test]
    fn returned_transaction_is_never_overdue() {
        let checkout = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let mut txn = open_transaction(checkout, Some(day(2024, 3, 2)));
        txn.status = TransactionStatus::Returned;
        txn.return_date = Some(checkout + Duration::days(4));
        assert!(!txn.is_overdue_at(day(2024, 3, 10)));
    }

    #[test]
    fn yesterday_due_date_is_overdue_immediately() {
        let yesterday = Utc::now().date_naive() - Duration::days(1);
        let txn = open_transaction(Utc::now(), Some(yesterday));
        assert!(txn.is_overdue());
    }

    #[test]
    fn days_out_counts_calendar_days_while_open() {
        let now = Utc.with_ymd_and_hms(2024, 3, 6, 7, 0, 0).unwrap();
        let txn = open_transaction(now - Duration::days(5), None);
        assert_eq!(txn.days_out_at(now), 5);
    }

    #[test]
    fn days_out_uses_return_date_once_returned() {
        let checkout = Utc.with_ymd_and_hms(2024, 3, 1, 23, 30, 0).unwrap();
        let mut txn = open_transaction(checkout, None);
        txn.status = TransactionStatus::Returned;
        txn.return_date = Some(Utc.with_ymd_and_hms(2024, 3, 3, 0, 15, 0).unwrap());

        let much_later = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(txn.days_out_at(much_later), 2);
    }
}

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{entity::prelude::*, ActiveValue::Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "employees")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    #[sea_orm(unique)]
    pub employee_number: String,
    pub department: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub is_active: bool,
    pub primary_work_center_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Name followed by the badge number, e.g. `Jo Smith (E1001)`
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.full_name(), self.employee_number)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::work_center::Entity",
        from = "Column::PrimaryWorkCenterId",
        to = "super::work_center::Column::Id",
        on_delete = "SetNull"
    )]
    PrimaryWorkCenter,
    #[sea_orm(has_many = "super::tool_transaction::Entity")]
    Transactions,
}

impl Related<super::work_center::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PrimaryWorkCenter.def()
    }
}

impl Related<super::tool_transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
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

    fn employee(first: &str, last: &str) -> Model {
        Model {
            id: Uuid::new_v4(),
            first_name: first.into(),
            last_name: last.into(),
            employee_number: "E1001".into(),
            department: "Machining".into(),
            email: None,
            phone: None,
            hire_date: None,
            is_active: true,
            primary_work_center_id: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn display_name_includes_employee_number() {
        assert_eq!(employee("Jo", "Smith").display_name(), "Jo Smith (E1001)");
    }

    #[test]
    fn full_name_trims_missing_parts() {
        assert_eq!(employee("Cher", "").full_name(), "Cher");
    }
}

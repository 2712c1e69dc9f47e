use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_work_centers_table::Migration),
            Box::new(m20240101_000002_create_employees_table::Migration),
            Box::new(m20240101_000003_create_tools_table::Migration),
            Box::new(m20240101_000004_create_tool_transactions_table::Migration),
            Box::new(m20240101_000005_create_tool_measures_table::Migration),
        ]
    }
}

mod m20240101_000001_create_work_centers_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_work_centers_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(WorkCenters::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(WorkCenters::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(WorkCenters::Name).string_len(100).not_null())
                        .col(
                            ColumnDef::new(WorkCenters::Location)
                                .string_len(100)
                                .not_null()
                                .default(""),
                        )
                        .col(
                            ColumnDef::new(WorkCenters::Supervisor)
                                .string_len(100)
                                .not_null()
                                .default(""),
                        )
                        .col(ColumnDef::new(WorkCenters::Description).text().null())
                        .col(
                            ColumnDef::new(WorkCenters::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(WorkCenters::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WorkCenters::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_work_centers_name")
                        .table(WorkCenters::Table)
                        .col(WorkCenters::Name)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(WorkCenters::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum WorkCenters {
        Table,
        Id,
        Name,
        Location,
        Supervisor,
        Description,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_employees_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_employees_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Employees::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Employees::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Employees::FirstName).string_len(50).not_null())
                        .col(ColumnDef::new(Employees::LastName).string_len(50).not_null())
                        .col(
                            ColumnDef::new(Employees::EmployeeNumber)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Employees::Department)
                                .string_len(100)
                                .not_null()
                                .default(""),
                        )
                        .col(ColumnDef::new(Employees::Email).string_len(254).null())
                        .col(ColumnDef::new(Employees::Phone).string_len(20).null())
                        .col(ColumnDef::new(Employees::HireDate).date().null())
                        .col(
                            ColumnDef::new(Employees::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(Employees::PrimaryWorkCenterId).uuid().null())
                        .col(
                            ColumnDef::new(Employees::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Employees::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_employees_primary_work_center_id")
                                .from(Employees::Table, Employees::PrimaryWorkCenterId)
                                .to(WorkCenters::Table, WorkCenters::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_employees_employee_number")
                        .table(Employees::Table)
                        .col(Employees::EmployeeNumber)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_employees_department")
                        .table(Employees::Table)
                        .col(Employees::Department)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Employees::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Employees {
        Table,
        Id,
        FirstName,
        LastName,
        EmployeeNumber,
        Department,
        Email,
        Phone,
        HireDate,
        IsActive,
        PrimaryWorkCenterId,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum WorkCenters {
        Table,
        Id,
    }
}

mod m20240101_000003_create_tools_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_tools_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Tools::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Tools::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Tools::Name).string_len(100).not_null())
                        .col(ColumnDef::new(Tools::SerialNumber).string_len(50).not_null())
                        .col(
                            ColumnDef::new(Tools::Calibrated)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Tools::Description).text().null())
                        .col(ColumnDef::new(Tools::CurrentLocationId).uuid().null())
                        .col(
                            ColumnDef::new(Tools::Status)
                                .string_len(20)
                                .not_null()
                                .default("available"),
                        )
                        .col(ColumnDef::new(Tools::AssignedToId).uuid().null())
                        .col(
                            ColumnDef::new(Tools::CheckedOutDate)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Tools::DueDate)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Tools::LastCheckedIn)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Tools::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Tools::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_tools_current_location_id")
                                .from(Tools::Table, Tools::CurrentLocationId)
                                .to(WorkCenters::Table, WorkCenters::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_tools_assigned_to_id")
                                .from(Tools::Table, Tools::AssignedToId)
                                .to(Employees::Table, Employees::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_tools_serial_number")
                        .table(Tools::Table)
                        .col(Tools::SerialNumber)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_tools_current_location_id")
                        .table(Tools::Table)
                        .col(Tools::CurrentLocationId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Tools::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Tools {
        Table,
        Id,
        Name,
        SerialNumber,
        Calibrated,
        Description,
        CurrentLocationId,
        Status,
        AssignedToId,
        CheckedOutDate,
        DueDate,
        LastCheckedIn,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum WorkCenters {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum Employees {
        Table,
        Id,
    }
}

mod m20240101_000004_create_tool_transactions_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_tool_transactions_table"
        }
    }

    /// At most one open transaction per tool, enforced by the store itself.
    /// Partial indexes are not expressible through the index builder, so the
    /// statement is issued directly; the syntax is shared by SQLite and Postgres.
    const OPEN_TRANSACTION_INDEX: &str = "CREATE UNIQUE INDEX IF NOT EXISTS \
         uq_tool_transactions_open_tool ON tool_transactions (tool_id) \
         WHERE status = 'checked_out'";

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ToolTransactions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ToolTransactions::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ToolTransactions::ToolId).uuid().not_null())
                        .col(
                            ColumnDef::new(ToolTransactions::EmployeeId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ToolTransactions::FromLocationId)
                                .uuid()
                                .null(),
                        )
                        .col(ColumnDef::new(ToolTransactions::ToLocationId).uuid().null())
                        .col(
                            ColumnDef::new(ToolTransactions::CheckoutDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ToolTransactions::ExpectedReturnDate)
                                .date()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ToolTransactions::ReturnDate)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ToolTransactions::ReturnEmployeeId)
                                .uuid()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ToolTransactions::Status)
                                .string_len(20)
                                .not_null()
                                .default("checked_out"),
                        )
                        .col(
                            ColumnDef::new(ToolTransactions::Notes)
                                .text()
                                .not_null()
                                .default(""),
                        )
                        .col(
                            ColumnDef::new(ToolTransactions::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ToolTransactions::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_tool_transactions_tool_id")
                                .from(ToolTransactions::Table, ToolTransactions::ToolId)
                                .to(Tools::Table, Tools::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_tool_transactions_employee_id")
                                .from(ToolTransactions::Table, ToolTransactions::EmployeeId)
                                .to(Employees::Table, Employees::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_tool_transactions_from_location_id")
                                .from(ToolTransactions::Table, ToolTransactions::FromLocationId)
                                .to(WorkCenters::Table, WorkCenters::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_tool_transactions_to_location_id")
                                .from(ToolTransactions::Table, ToolTransactions::ToLocationId)
                                .to(WorkCenters::Table, WorkCenters::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_tool_transactions_return_employee_id")
                                .from(
                                    ToolTransactions::Table,
                                    ToolTransactions::ReturnEmployeeId,
                                )
                                .to(Employees::Table, Employees::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_tool_transactions_employee_id")
                        .table(ToolTransactions::Table)
                        .col(ToolTransactions::EmployeeId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_tool_transactions_status")
                        .table(ToolTransactions::Table)
                        .col(ToolTransactions::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .get_connection()
                .execute_unprepared(OPEN_TRANSACTION_INDEX)
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ToolTransactions::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ToolTransactions {
        Table,
        Id,
        ToolId,
        EmployeeId,
        FromLocationId,
        ToLocationId,
        CheckoutDate,
        ExpectedReturnDate,
        ReturnDate,
        ReturnEmployeeId,
        Status,
        Notes,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Tools {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum Employees {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum WorkCenters {
        Table,
        Id,
    }
}

mod m20240101_000005_create_tool_measures_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_tool_measures_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ToolMeasures::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ToolMeasures::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ToolMeasures::ToolId).uuid().not_null())
                        .col(ColumnDef::new(ToolMeasures::EmployeeId).uuid().not_null())
                        .col(ColumnDef::new(ToolMeasures::WorkCenterId).uuid().null())
                        .col(
                            ColumnDef::new(ToolMeasures::MeasurementDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ToolMeasures::SizeMeasured)
                                .decimal_len(10, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ToolMeasures::ExpectedSize)
                                .decimal_len(10, 4)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ToolMeasures::Tolerance)
                                .decimal_len(10, 4)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ToolMeasures::Condition)
                                .string_len(20)
                                .not_null()
                                .default("good"),
                        )
                        .col(
                            ColumnDef::new(ToolMeasures::Notes)
                                .text()
                                .not_null()
                                .default(""),
                        )
                        .col(
                            ColumnDef::new(ToolMeasures::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ToolMeasures::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_tool_measures_tool_id")
                                .from(ToolMeasures::Table, ToolMeasures::ToolId)
                                .to(Tools::Table, Tools::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_tool_measures_employee_id")
                                .from(ToolMeasures::Table, ToolMeasures::EmployeeId)
                                .to(Employees::Table, Employees::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_tool_measures_work_center_id")
                                .from(ToolMeasures::Table, ToolMeasures::WorkCenterId)
                                .to(WorkCenters::Table, WorkCenters::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_tool_measures_tool_id")
                        .table(ToolMeasures::Table)
                        .col(ToolMeasures::ToolId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_tool_measures_measurement_date")
                        .table(ToolMeasures::Table)
                        .col(ToolMeasures::MeasurementDate)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ToolMeasures::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ToolMeasures {
        Table,
        Id,
        ToolId,
        EmployeeId,
        WorkCenterId,
        MeasurementDate,
        SizeMeasured,
        ExpectedSize,
        Tolerance,
        Condition,
        Notes,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Tools {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum Employees {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum WorkCenters {
        Table,
        Id,
    }
}

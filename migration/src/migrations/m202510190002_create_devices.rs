use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202510190002_create_devices"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("devices"))
                    .if_not_exists()
                    .col(ColumnDef::new(Alias::new("id")).string().not_null().primary_key())
                    .col(ColumnDef::new(Alias::new("user_id")).string().not_null())
                    .col(ColumnDef::new(Alias::new("name")).string().not_null())
                    .col(
                        ColumnDef::new(Alias::new("device_type"))
                            .enumeration(
                                Alias::new("device_type"),
                                vec![
                                    Alias::new("desktop"),
                                    Alias::new("laptop"),
                                    Alias::new("tablet"),
                                    Alias::new("phone"),
                                    Alias::new("server"),
                                    Alias::new("other"),
                                ],
                            )
                            .not_null()
                            .default("other"),
                    )
                    .col(ColumnDef::new(Alias::new("os_name")).string())
                    .col(ColumnDef::new(Alias::new("os_version")).string())
                    .col(ColumnDef::new(Alias::new("processor")).string())
                    .col(ColumnDef::new(Alias::new("ram")).string())
                    .col(ColumnDef::new(Alias::new("storage")).string())
                    // No FK: diagnostics reference devices, and the pointer is checked in code.
                    .col(ColumnDef::new(Alias::new("last_diagnostic_id")).string())
                    .col(
                        ColumnDef::new(Alias::new("created_at"))
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("CURRENT_TIMESTAMP")),
                    )
                    .col(
                        ColumnDef::new(Alias::new("updated_at"))
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("CURRENT_TIMESTAMP")),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Alias::new("devices"), Alias::new("user_id"))
                            .to(Alias::new("users"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_devices_user_id")
                    .table(Alias::new("devices"))
                    .col(Alias::new("user_id"))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Alias::new("devices")).to_owned())
            .await
    }
}

use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202510190003_create_diagnostics"
    }
}

fn component_status(name: &str) -> ColumnDef {
    ColumnDef::new(Alias::new(name))
        .enumeration(
            Alias::new("component_status"),
            vec![
                Alias::new("normal"),
                Alias::new("warning"),
                Alias::new("critical"),
            ],
        )
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("diagnostics"))
                    .if_not_exists()
                    .col(ColumnDef::new(Alias::new("id")).string().not_null().primary_key())
                    .col(ColumnDef::new(Alias::new("device_id")).string().not_null())
                    .col(ColumnDef::new(Alias::new("user_id")).string().not_null())
                    .col(
                        ColumnDef::new(Alias::new("status"))
                            .enumeration(
                                Alias::new("diagnostic_status"),
                                vec![
                                    Alias::new("pending"),
                                    Alias::new("running"),
                                    Alias::new("completed"),
                                    Alias::new("failed"),
                                ],
                            )
                            .not_null()
                            .default("pending"),
                    )
                    .col(component_status("cpu_status"))
                    .col(component_status("memory_status"))
                    .col(component_status("disk_status"))
                    .col(component_status("network_status"))
                    .col(component_status("battery_status"))
                    .col(ColumnDef::new(Alias::new("cpu_metrics")).json())
                    .col(ColumnDef::new(Alias::new("memory_metrics")).json())
                    .col(ColumnDef::new(Alias::new("disk_metrics")).json())
                    .col(ColumnDef::new(Alias::new("network_metrics")).json())
                    .col(ColumnDef::new(Alias::new("battery_metrics")).json())
                    .col(ColumnDef::new(Alias::new("antivirus_metrics")).json())
                    .col(ColumnDef::new(Alias::new("driver_metrics")).json())
                    .col(ColumnDef::new(Alias::new("health_score")).integer())
                    .col(ColumnDef::new(Alias::new("issues")).json().not_null())
                    .col(ColumnDef::new(Alias::new("recommendations")).json().not_null())
                    .col(ColumnDef::new(Alias::new("client_name")).string())
                    .col(ColumnDef::new(Alias::new("client_phone")).string())
                    .col(ColumnDef::new(Alias::new("raw_data")).json())
                    .col(ColumnDef::new(Alias::new("error_message")).text())
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
                            .from(Alias::new("diagnostics"), Alias::new("device_id"))
                            .to(Alias::new("devices"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Alias::new("diagnostics"), Alias::new("user_id"))
                            .to(Alias::new("users"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_diagnostics_device_created")
                    .table(Alias::new("diagnostics"))
                    .col(Alias::new("device_id"))
                    .col(Alias::new("created_at"))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Alias::new("diagnostics")).to_owned())
            .await
    }
}

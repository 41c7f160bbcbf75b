use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(GenLogs::Table)
                    .add_column_if_not_exists(ColumnDef::new(GenLogs::ComparisonGroupId).integer())
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_gen_logs_comparison_group_id")
                    .table(GenLogs::Table)
                    .col(GenLogs::ComparisonGroupId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LogAssets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LogAssets::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LogAssets::LogId).integer().not_null())
                    .col(ColumnDef::new(LogAssets::FileKey).text().not_null())
                    .col(ColumnDef::new(LogAssets::AssetType).string_len(20).not_null())
                    .col(ColumnDef::new(LogAssets::Note).text())
                    .col(
                        ColumnDef::new(LogAssets::SortOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(LogAssets::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(LogAssets::Table, LogAssets::LogId)
                            .to(GenLogs::Table, GenLogs::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_log_assets_log_id")
                    .table(LogAssets::Table)
                    .col(LogAssets::LogId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LogOutputGroups::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LogOutputGroups::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LogOutputGroups::LogId).integer().not_null())
                    .col(ColumnDef::new(LogOutputGroups::Tools).array(ColumnType::Text))
                    .col(ColumnDef::new(LogOutputGroups::Models).array(ColumnType::Text))
                    .col(
                        ColumnDef::new(LogOutputGroups::SortOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(LogOutputGroups::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(LogOutputGroups::Table, LogOutputGroups::LogId)
                            .to(GenLogs::Table, GenLogs::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_log_output_groups_log_id")
                    .table(LogOutputGroups::Table)
                    .col(LogOutputGroups::LogId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LogOutputGroups::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LogAssets::Table).to_owned())
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_gen_logs_comparison_group_id")
                    .to_owned(),
            )
            .await?;
        manager
            .alter_table(
                Table::alter()
                    .table(GenLogs::Table)
                    .drop_column(GenLogs::ComparisonGroupId)
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
enum GenLogs {
    Table,
    Id,
    ComparisonGroupId,
}

#[derive(Iden)]
enum LogAssets {
    Table,
    Id,
    LogId,
    FileKey,
    AssetType,
    Note,
    SortOrder,
    CreatedAt,
}

#[derive(Iden)]
enum LogOutputGroups {
    Table,
    Id,
    LogId,
    Tools,
    Models,
    SortOrder,
    CreatedAt,
}

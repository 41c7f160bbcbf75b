use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GenLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GenLogs::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(GenLogs::Title).string_len(200).not_null())
                    .col(ColumnDef::new(GenLogs::LogType).string_len(20).not_null())
                    .col(ColumnDef::new(GenLogs::Tools).array(ColumnType::Text))
                    .col(ColumnDef::new(GenLogs::Models).array(ColumnType::Text))
                    .col(ColumnDef::new(GenLogs::Prompt).text())
                    .col(ColumnDef::new(GenLogs::ParamsNote).text())
                    .col(
                        ColumnDef::new(GenLogs::IsNsfw)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(GenLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(GenLogs::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_gen_logs_created_at")
                    .table(GenLogs::Table)
                    .col(GenLogs::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GenLogs::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum GenLogs {
    Table,
    Id,
    Title,
    LogType,
    Tools,
    Models,
    Prompt,
    ParamsNote,
    IsNsfw,
    CreatedAt,
    UpdatedAt,
}

//! Create ap_user_settings table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ApUserSettings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ApUserSettings::CcId)
                            .text()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ApUserSettings::ListenTimelines)
                            .json_binary()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ApUserSettings::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ApUserSettings {
    Table,
    CcId,
    ListenTimelines,
}

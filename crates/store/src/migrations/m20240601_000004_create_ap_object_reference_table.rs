//! Create ap_object_reference table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ApObjectReference::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ApObjectReference::ApObjectId)
                            .text()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ApObjectReference::CcObjectId)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .to_owned(),
            )
            .await?;

        // Delete/Undo look references up by the Native side.
        manager
            .create_index(
                Index::create()
                    .name("idx_ap_object_reference_cc")
                    .table(ApObjectReference::Table)
                    .col(ApObjectReference::CcObjectId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ApObjectReference::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ApObjectReference {
    Table,
    ApObjectId,
    CcObjectId,
}

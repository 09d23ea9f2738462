//! Create ap_entity table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ApEntity::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ApEntity::Id).text().not_null().primary_key())
                    .col(ColumnDef::new(ApEntity::Ccid).char_len(42).not_null())
                    .col(ColumnDef::new(ApEntity::PublicKey).text().not_null())
                    .col(ColumnDef::new(ApEntity::PrivateKey).text().not_null())
                    .col(
                        ColumnDef::new(ApEntity::AlsoKnownAs)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ApEntity::Enabled)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ap_entity_ccid")
                    .table(ApEntity::Table)
                    .col(ApEntity::Ccid)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ApEntity::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ApEntity {
    Table,
    Id,
    Ccid,
    PublicKey,
    PrivateKey,
    AlsoKnownAs,
    Enabled,
}

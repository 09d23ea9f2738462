//! Create ap_follow table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ApFollow::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ApFollow::Id).text().not_null().primary_key())
                    .col(
                        ColumnDef::new(ApFollow::Accepted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ApFollow::PublisherPersonUrl)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ApFollow::SubscriberUserId).text().not_null())
                    .to_owned(),
            )
            .await?;

        // Inbound Create/Announce fan-in looks follows up by publisher.
        manager
            .create_index(
                Index::create()
                    .name("idx_ap_follow_publisher")
                    .table(ApFollow::Table)
                    .col(ApFollow::PublisherPersonUrl)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ApFollow::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ApFollow {
    Table,
    Id,
    Accepted,
    PublisherPersonUrl,
    SubscriberUserId,
}

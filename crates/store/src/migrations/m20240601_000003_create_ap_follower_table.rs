//! Create ap_follower table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ApFollower::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ApFollower::Id)
                            .text()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ApFollower::SubscriberPersonUrl)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ApFollower::PublisherUserId)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ApFollower::SubscriberInbox)
                            .text()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // One follower row per (local entity, remote actor).
        manager
            .create_index(
                Index::create()
                    .name("uniq_ap_follower")
                    .table(ApFollower::Table)
                    .col(ApFollower::PublisherUserId)
                    .col(ApFollower::SubscriberPersonUrl)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ApFollower::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ApFollower {
    Table,
    Id,
    SubscriberPersonUrl,
    PublisherUserId,
    SubscriberInbox,
}

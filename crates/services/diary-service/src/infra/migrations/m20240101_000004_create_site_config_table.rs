//! Migration: Create the single-row site_config table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SiteConfig::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SiteConfig::Id)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SiteConfig::SiteName).string_len(255).not_null())
                    .col(ColumnDef::new(SiteConfig::Announcement).text().null())
                    .col(
                        ColumnDef::new(SiteConfig::RegistrationOpen)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(SiteConfig::MaxEntryLength)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SiteConfig::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SiteConfig::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum SiteConfig {
    Table,
    Id,
    SiteName,
    Announcement,
    RegistrationOpen,
    MaxEntryLength,
    UpdatedAt,
}

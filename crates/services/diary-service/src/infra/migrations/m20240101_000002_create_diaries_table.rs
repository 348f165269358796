//! Migration: Create diaries table.

use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_users_table::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Diaries::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Diaries::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Diaries::AuthorId).uuid().not_null())
                    .col(ColumnDef::new(Diaries::Title).string_len(255).not_null())
                    .col(ColumnDef::new(Diaries::Content).text().not_null())
                    .col(ColumnDef::new(Diaries::Mood).string_len(64).null())
                    .col(ColumnDef::new(Diaries::Weather).string_len(64).null())
                    .col(
                        ColumnDef::new(Diaries::Visibility)
                            .string_len(16)
                            .not_null()
                            .default("private"),
                    )
                    .col(
                        ColumnDef::new(Diaries::Status)
                            .string_len(16)
                            .not_null()
                            .default("published"),
                    )
                    .col(
                        ColumnDef::new(Diaries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Diaries::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Diaries::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_diaries_author_id")
                            .from(Diaries::Table, Diaries::AuthorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_diaries_author_id")
                    .table(Diaries::Table)
                    .col(Diaries::AuthorId)
                    .to_owned(),
            )
            .await?;

        // Public feed filters on both columns
        manager
            .create_index(
                Index::create()
                    .name("idx_diaries_visibility_status")
                    .table(Diaries::Table)
                    .col(Diaries::Visibility)
                    .col(Diaries::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Diaries::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Diaries {
    Table,
    Id,
    AuthorId,
    Title,
    Content,
    Mood,
    Weather,
    Visibility,
    Status,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

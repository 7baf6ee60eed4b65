use sea_orm_migration::prelude::*;

use crate::m20260801_000002_create_otps::Otps;
use crate::m20260801_000003_create_notes::Notes;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .table(Otps::Table)
                    .col(Otps::Email)
                    .col(Otps::Purpose)
                    .name("idx_otps_email_purpose")
                    .to_owned(),
            )
            .await?;

        // The sweep deletes by expiry; keep that scan cheap.
        manager
            .create_index(
                Index::create()
                    .table(Otps::Table)
                    .col(Otps::ExpiresAt)
                    .name("idx_otps_expires_at")
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(Notes::Table)
                    .col(Notes::UserId)
                    .col(Notes::CreatedAt)
                    .name("idx_notes_user_id_created_at")
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(Notes::Table)
                    .col(Notes::UserId)
                    .col(Notes::IsPinned)
                    .col(Notes::CreatedAt)
                    .name("idx_notes_user_id_pinned_created_at")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for name in [
            "idx_notes_user_id_pinned_created_at",
            "idx_notes_user_id_created_at",
            "idx_otps_expires_at",
            "idx_otps_email_purpose",
        ] {
            manager
                .drop_index(Index::drop().name(name).to_owned())
                .await?;
        }
        Ok(())
    }
}

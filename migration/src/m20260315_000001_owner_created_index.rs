use sea_orm_migration::prelude::*;

use crate::m20260301_000001_qr_codes::QrCode;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 列表查询按 owner 过滤并按创建时间倒序
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_qr_codes_owner_created")
                    .table(QrCode::Table)
                    .col(QrCode::OwnerId)
                    .col(QrCode::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_qr_codes_owner_created")
                    .table(QrCode::Table)
                    .to_owned(),
            )
            .await
    }
}

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建 qr_codes 表
        manager
            .create_table(
                Table::create()
                    .table(QrCode::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(QrCode::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(QrCode::Slug).string_len(64).not_null())
                    .col(ColumnDef::new(QrCode::Name).string().not_null())
                    .col(ColumnDef::new(QrCode::Description).text().null())
                    .col(ColumnDef::new(QrCode::TargetUrl).text().not_null())
                    .col(ColumnDef::new(QrCode::OwnerId).string().not_null())
                    .col(
                        ColumnDef::new(QrCode::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(QrCode::ValidUntil)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(QrCode::ScanCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(QrCode::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(QrCode::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // slug 全局唯一，由数据库保证
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_qr_codes_slug")
                    .table(QrCode::Table)
                    .col(QrCode::Slug)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_qr_codes_owner_id")
                    .table(QrCode::Table)
                    .col(QrCode::OwnerId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_qr_codes_owner_id")
                    .table(QrCode::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("uq_qr_codes_slug")
                    .table(QrCode::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(QrCode::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum QrCode {
    #[sea_orm(iden = "qr_codes")]
    Table,
    Id,
    Slug,
    Name,
    Description,
    TargetUrl,
    OwnerId,
    IsActive,
    ValidUntil,
    ScanCount,
    CreatedAt,
    UpdatedAt,
}

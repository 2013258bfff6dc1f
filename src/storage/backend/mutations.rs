//! 写操作
//!
//! 插入冲突由唯一索引兜底，更新只写 patch 给出的列。

use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, DbErr, EntityTrait};
use tracing::info;

use super::converters::{apply_patch, model_to_qr_code, qr_code_to_active_model};
use super::{SeaOrmStorage, retry};
use crate::errors::{QrLinkerError, Result};
use crate::storage::{QrCode, QrCodePatch};

use migration::entities::qr_code;

impl SeaOrmStorage {
    pub(super) async fn insert_code(&self, code: &QrCode) -> Result<()> {
        let db = &self.db;

        retry::with_retry_timeout(
            &format!("insert({})", code.slug),
            self.retry_config,
            self.timeout_ms,
            || async {
                qr_code::Entity::insert(qr_code_to_active_model(code))
                    .exec_without_returning(db)
                    .await
            },
        )
        .await
        .map_err(|e| match QrLinkerError::from(e) {
            QrLinkerError::Conflict(_) => {
                QrLinkerError::conflict(format!("slug already in use: {}", code.slug))
            }
            other => other,
        })?;

        info!("QR code created: {} ({})", code.slug, code.id);
        Ok(())
    }

    pub(super) async fn update_code(
        &self,
        id: &str,
        patch: &QrCodePatch,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<QrCode>> {
        let db = &self.db;

        let result = retry::with_retry_timeout(
            &format!("update({})", id),
            self.retry_config,
            self.timeout_ms,
            || async { apply_patch(id, patch, updated_at).update(db).await },
        )
        .await;

        match result {
            Ok(model) => Ok(Some(model_to_qr_code(model))),
            // UPDATE 没有命中任何行
            Err(DbErr::RecordNotUpdated) | Err(DbErr::RecordNotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub(super) async fn delete_code(&self, id: &str) -> Result<bool> {
        let db = &self.db;

        let result = retry::with_retry_timeout(
            &format!("delete({})", id),
            self.retry_config,
            self.timeout_ms,
            || async { qr_code::Entity::delete_by_id(id).exec(db).await },
        )
        .await?;

        if result.rows_affected > 0 {
            info!("QR code deleted: {}", id);
        }
        Ok(result.rows_affected > 0)
    }
}

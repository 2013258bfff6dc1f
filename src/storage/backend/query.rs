//! 只读查询

use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};

use super::converters::model_to_qr_code;
use super::{SeaOrmStorage, retry};
use crate::errors::Result;
use crate::storage::QrCode;

use migration::entities::qr_code;

impl SeaOrmStorage {
    pub(super) async fn get_by_id(&self, id: &str) -> Result<Option<QrCode>> {
        let db = &self.db;

        let model = retry::with_retry_timeout(
            &format!("get({})", id),
            self.retry_config,
            self.timeout_ms,
            || async { qr_code::Entity::find_by_id(id).one(db).await },
        )
        .await?;

        Ok(model.map(model_to_qr_code))
    }

    /// 扫码路径上的查询，不做重试，超时交给调用方控制
    pub(super) async fn get_by_slug(&self, slug: &str) -> Result<Option<QrCode>> {
        let model = qr_code::Entity::find()
            .filter(qr_code::Column::Slug.eq(slug))
            .one(&self.db)
            .await?;

        Ok(model.map(model_to_qr_code))
    }

    pub(super) async fn list_owner_codes(&self, owner_id: &str) -> Result<Vec<QrCode>> {
        let db = &self.db;

        let models = retry::with_retry_timeout(
            &format!("list_by_owner({})", owner_id),
            self.retry_config,
            self.timeout_ms,
            || async {
                qr_code::Entity::find()
                    .filter(qr_code::Column::OwnerId.eq(owner_id))
                    .order_by_desc(qr_code::Column::CreatedAt)
                    .order_by_desc(qr_code::Column::Id)
                    .all(db)
                    .await
            },
        )
        .await?;

        Ok(models.into_iter().map(model_to_qr_code).collect())
    }

    pub(super) async fn count_codes(&self) -> Result<u64> {
        let db = &self.db;
        let count = retry::with_retry_timeout("count", self.retry_config, self.timeout_ms, || async {
            qr_code::Entity::find().count(db).await
        })
        .await?;
        Ok(count)
    }
}

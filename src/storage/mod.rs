use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::analytics::ScanSink;
use crate::config::DatabaseConfig;
use crate::errors::Result;

pub mod backend;
pub mod memory;
pub mod models;

pub use backend::SeaOrmStorage;
pub use memory::MemoryStorage;
pub use models::{CodeStats, CodeStatus, QrCode, QrCodePatch, StorageConfig};

/// 二维码记录存储接口
///
/// Registry、ResolutionEngine 和扫码计数都通过构造参数拿到它，
/// 不存在全局存储单例。
#[async_trait]
pub trait CodeStore: Send + Sync {
    /// 插入新记录；slug 或 id 冲突时返回 `Conflict`
    async fn insert(&self, code: &QrCode) -> Result<()>;

    async fn get(&self, id: &str) -> Result<Option<QrCode>>;

    /// 唯一一个不按 owner 过滤的查询
    async fn find_by_slug(&self, slug: &str) -> Result<Option<QrCode>>;

    /// 只修改 patch 中给出的字段，不触碰 scan_count；记录不存在时返回 `None`
    async fn update(
        &self,
        id: &str,
        patch: &QrCodePatch,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<QrCode>>;

    /// 立即删除；返回是否真的删除了记录
    async fn delete(&self, id: &str) -> Result<bool>;

    /// 按创建时间倒序
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<QrCode>>;

    /// 原子地累加扫码次数（`scan_count = scan_count + n`），返回受影响的记录数
    async fn add_scans(&self, updates: &[(String, u64)]) -> Result<u64>;

    async fn count(&self) -> Result<u64>;

    fn backend_config(&self) -> StorageConfig;

    fn as_scan_sink(&self) -> Arc<dyn ScanSink>;
}

/// 内存存储的 URL 标识
pub const MEMORY_DATABASE_URL: &str = "memory";

pub struct StorageFactory;

impl StorageFactory {
    pub async fn create(config: &DatabaseConfig) -> Result<Arc<dyn CodeStore>> {
        let database_url = &config.database_url;

        if database_url == MEMORY_DATABASE_URL {
            tracing::warn!("Using in-memory storage: QR codes are lost on restart");
            return Ok(Arc::new(MemoryStorage::new()));
        }

        // 从 URL 自动推断数据库类型
        let backend_type = backend::infer_backend_from_url(database_url)?;

        let storage = SeaOrmStorage::new(database_url, &backend_type, config).await?;
        Ok(Arc::new(storage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_factory_memory_backend() {
        let config = DatabaseConfig {
            database_url: MEMORY_DATABASE_URL.to_string(),
            ..Default::default()
        };
        let store = StorageFactory::create(&config).await.unwrap();
        assert_eq!(store.backend_config().storage_type, "memory");
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_factory_rejects_unknown_url() {
        let config = DatabaseConfig {
            database_url: "mongodb://localhost".to_string(),
            ..Default::default()
        };
        assert!(StorageFactory::create(&config).await.is_err());
    }
}

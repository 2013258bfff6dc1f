//! SeaORM storage backend
//!
//! SQLite, MySQL/MariaDB and PostgreSQL behind one `CodeStore` implementation.

mod connection;
mod converters;
mod mutations;
mod query;
pub mod retry;
mod scan_sink;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use tracing::info;

use crate::analytics::ScanSink;
use crate::config::DatabaseConfig;
use crate::errors::{QrLinkerError, Result};
use crate::storage::{CodeStore, QrCode, QrCodePatch, StorageConfig};

pub use connection::{connect_generic, connect_sqlite, run_migrations};
pub use converters::{model_to_qr_code, qr_code_to_active_model};

/// 从数据库 URL 推断数据库类型
pub fn infer_backend_from_url(database_url: &str) -> Result<String> {
    if database_url.starts_with("sqlite:")
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
        || database_url == ":memory:"
    {
        Ok("sqlite".to_string())
    } else if database_url.starts_with("mysql://") || database_url.starts_with("mariadb://") {
        Ok("mysql".to_string())
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok("postgres".to_string())
    } else {
        Err(QrLinkerError::database_config(format!(
            "无法从 URL 推断数据库类型: {}. 支持的 URL 格式: sqlite://, mysql://, mariadb://, postgres://, memory",
            database_url
        )))
    }
}

/// SeaORM-based storage backend
#[derive(Clone)]
pub struct SeaOrmStorage {
    db: DatabaseConnection,
    backend_name: String,
    retry_config: retry::RetryConfig,
    /// 单次操作超时
    timeout_ms: u64,
}

impl SeaOrmStorage {
    pub async fn new(database_url: &str, backend_name: &str, config: &DatabaseConfig) -> Result<Self> {
        if database_url.is_empty() {
            return Err(QrLinkerError::database_config("database_url 未设置"));
        }

        let db = if backend_name == "sqlite" {
            connect_sqlite(database_url).await?
        } else {
            connect_generic(database_url, backend_name, config.pool_size).await?
        };

        run_migrations(&db).await?;

        let storage = SeaOrmStorage {
            db,
            backend_name: backend_name.to_string(),
            retry_config: retry::RetryConfig::from(config),
            timeout_ms: config.timeout_ms,
        };

        info!("{} storage initialized", storage.backend_name.to_uppercase());
        Ok(storage)
    }

    pub fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl CodeStore for SeaOrmStorage {
    async fn insert(&self, code: &QrCode) -> Result<()> {
        self.insert_code(code).await
    }

    async fn get(&self, id: &str) -> Result<Option<QrCode>> {
        self.get_by_id(id).await
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<QrCode>> {
        self.get_by_slug(slug).await
    }

    async fn update(
        &self,
        id: &str,
        patch: &QrCodePatch,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<QrCode>> {
        self.update_code(id, patch, updated_at).await
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        self.delete_code(id).await
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<QrCode>> {
        self.list_owner_codes(owner_id).await
    }

    async fn add_scans(&self, updates: &[(String, u64)]) -> Result<u64> {
        self.add_scans_batch(updates).await
    }

    async fn count(&self) -> Result<u64> {
        self.count_codes().await
    }

    fn backend_config(&self) -> StorageConfig {
        StorageConfig {
            storage_type: self.backend_name.clone(),
            support_scan_count: true,
        }
    }

    fn as_scan_sink(&self) -> Arc<dyn ScanSink> {
        Arc::new(self.clone())
    }
}

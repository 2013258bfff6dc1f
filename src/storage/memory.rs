//! 进程内存储
//!
//! 单机演示和测试使用，重启即丢失。slug 唯一性由 DashMap 的 entry 锁保证。

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::analytics::ScanSink;
use crate::errors::{QrLinkerError, Result};
use crate::storage::{CodeStore, QrCode, QrCodePatch, StorageConfig};

#[derive(Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    codes: DashMap<String, QrCode>,
    /// slug -> id
    slugs: DashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CodeStore for MemoryStorage {
    async fn insert(&self, code: &QrCode) -> Result<()> {
        match self.inner.slugs.entry(code.slug.clone()) {
            Entry::Occupied(_) => Err(QrLinkerError::conflict(format!(
                "slug already in use: {}",
                code.slug
            ))),
            Entry::Vacant(slot) => {
                if self.inner.codes.contains_key(&code.id) {
                    return Err(QrLinkerError::conflict(format!(
                        "id already in use: {}",
                        code.id
                    )));
                }
                self.inner.codes.insert(code.id.clone(), code.clone());
                slot.insert(code.id.clone());
                Ok(())
            }
        }
    }

    async fn get(&self, id: &str) -> Result<Option<QrCode>> {
        Ok(self.inner.codes.get(id).map(|c| c.value().clone()))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<QrCode>> {
        let Some(id) = self.inner.slugs.get(slug).map(|id| id.value().clone()) else {
            return Ok(None);
        };
        Ok(self.inner.codes.get(&id).map(|c| c.value().clone()))
    }

    async fn update(
        &self,
        id: &str,
        patch: &QrCodePatch,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<QrCode>> {
        Ok(self.inner.codes.get_mut(id).map(|mut entry| {
            patch.apply_to(entry.value_mut(), updated_at);
            entry.value().clone()
        }))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        match self.inner.codes.remove(id) {
            Some((_, code)) => {
                self.inner.slugs.remove(&code.slug);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<QrCode>> {
        let mut codes: Vec<QrCode> = self
            .inner
            .codes
            .iter()
            .filter(|entry| entry.owner_id == owner_id)
            .map(|entry| entry.value().clone())
            .collect();
        codes.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(codes)
    }

    async fn add_scans(&self, updates: &[(String, u64)]) -> Result<u64> {
        let mut affected = 0;
        for (id, count) in updates {
            if *count == 0 {
                continue;
            }
            if let Some(mut entry) = self.inner.codes.get_mut(id) {
                entry.scan_count = entry.scan_count.saturating_add(*count);
                affected += 1;
            }
        }
        Ok(affected)
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.inner.codes.len() as u64)
    }

    fn backend_config(&self) -> StorageConfig {
        StorageConfig {
            storage_type: "memory".to_string(),
            support_scan_count: true,
        }
    }

    fn as_scan_sink(&self) -> Arc<dyn ScanSink> {
        Arc::new(self.clone())
    }
}

#[async_trait]
impl ScanSink for MemoryStorage {
    async fn flush_scans(&self, updates: Vec<(String, u64)>) -> anyhow::Result<()> {
        self.add_scans(&updates).await?;
        Ok(())
    }
}

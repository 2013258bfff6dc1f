//! QR code registry
//!
//! Owns slug issuance and the owner-scoped CRUD surface. All persistence goes
//! through the injected `CodeStore`; nothing here is cached.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::{RegistryConfig, StaticConfig};
use crate::errors::{QrLinkerError, Result};
use crate::services::owner_directory::{CallerIdentity, authorize, require_caller};
use crate::storage::{CodeStats, CodeStore, QrCode, QrCodePatch};
use crate::utils::url_validator::validate_url;
use crate::utils::{generate_random_code, is_reserved_slug, is_valid_slug};

/// Request to create a new QR code
#[derive(Debug, Clone)]
pub struct CreateQrCodeRequest {
    pub name: String,
    pub target_url: String,
    pub description: Option<String>,
    /// Custom slug (optional, generated when absent)
    pub slug: Option<String>,
    pub is_active: bool,
    pub valid_until: Option<DateTime<Utc>>,
}

impl CreateQrCodeRequest {
    pub fn new(name: impl Into<String>, target_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target_url: target_url.into(),
            description: None,
            slug: None,
            is_active: true,
            valid_until: None,
        }
    }
}

/// Registry settings
#[derive(Debug, Clone)]
pub struct RegistryOptions {
    pub slug_length: usize,
    pub max_slug_attempts: u32,
    /// 额外的保留路由前缀（API / health 前缀）
    pub reserved_prefixes: Vec<String>,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self::from(&RegistryConfig::default())
    }
}

impl From<&RegistryConfig> for RegistryOptions {
    fn from(config: &RegistryConfig) -> Self {
        Self {
            slug_length: config.slug_length,
            max_slug_attempts: config.max_slug_attempts.max(1),
            reserved_prefixes: Vec::new(),
        }
    }
}

impl RegistryOptions {
    pub fn from_config(config: &StaticConfig) -> Self {
        Self {
            reserved_prefixes: vec![
                config.auth.api_prefix.clone(),
                config.auth.health_prefix.clone(),
            ],
            ..Self::from(&config.registry)
        }
    }
}

pub struct CodeRegistry {
    store: Arc<dyn CodeStore>,
    options: RegistryOptions,
}

impl CodeRegistry {
    pub fn new(store: Arc<dyn CodeStore>, options: RegistryOptions) -> Self {
        Self { store, options }
    }

    pub fn store(&self) -> &Arc<dyn CodeStore> {
        &self.store
    }

    fn validate_name(name: &str) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(QrLinkerError::validation("name is required"));
        }
        Ok(name.to_string())
    }

    fn validate_target(target_url: &str) -> Result<String> {
        validate_url(target_url)
            .map(|_| target_url.trim().to_string())
            .map_err(|e| QrLinkerError::validation(format!("invalid target_url: {}", e)))
    }

    fn normalize_description(description: Option<&str>) -> Option<String> {
        description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string)
    }

    fn validate_custom_slug(&self, slug: &str) -> Result<()> {
        if !is_valid_slug(slug) {
            return Err(QrLinkerError::validation(format!(
                "invalid slug '{}': only letters, digits, '-' and '_' are allowed",
                slug
            )));
        }
        let prefixes: Vec<&str> = self
            .options
            .reserved_prefixes
            .iter()
            .map(String::as_str)
            .collect();
        if is_reserved_slug(slug, &prefixes) {
            return Err(QrLinkerError::validation(format!(
                "slug '{}' conflicts with a reserved route",
                slug
            )));
        }
        Ok(())
    }

    /// 加载记录并校验所有权
    async fn load_owned(&self, id: &str, caller: Option<&CallerIdentity>) -> Result<QrCode> {
        require_caller(caller)?;
        let code = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| QrLinkerError::not_found(format!("QR code '{}' not found", id)))?;
        authorize(caller, &code.owner_id)?;
        Ok(code)
    }

    pub async fn create(
        &self,
        caller: Option<&CallerIdentity>,
        req: CreateQrCodeRequest,
    ) -> Result<QrCode> {
        let owner = require_caller(caller)?;
        let name = Self::validate_name(&req.name)?;
        let target_url = Self::validate_target(&req.target_url)?;

        let custom_slug = req
            .slug
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        if let Some(ref slug) = custom_slug {
            self.validate_custom_slug(slug)?;
        }

        let now = Utc::now();
        let mut code = QrCode {
            id: uuid::Uuid::new_v4().to_string(),
            slug: String::new(),
            name,
            description: Self::normalize_description(req.description.as_deref()),
            target_url,
            owner_id: owner.owner_id.clone(),
            is_active: req.is_active,
            valid_until: req.valid_until,
            scan_count: 0,
            created_at: now,
            updated_at: now,
        };

        if let Some(slug) = custom_slug {
            code.slug = slug;
            self.store.insert(&code).await?;
            info!("Registry: {} created '{}' (custom slug)", code.owner_id, code.slug);
            return Ok(code);
        }

        let attempts = self.options.max_slug_attempts.max(1);
        for attempt in 1..=attempts {
            code.slug = generate_random_code(self.options.slug_length);
            match self.store.insert(&code).await {
                Ok(()) => {
                    info!("Registry: {} created '{}'", code.owner_id, code.slug);
                    return Ok(code);
                }
                Err(QrLinkerError::Conflict(_)) => {
                    debug!(
                        "Registry: generated slug '{}' collided (attempt {}/{})",
                        code.slug, attempt, attempts
                    );
                }
                Err(e) => return Err(e),
            }
        }

        warn!("Registry: slug generation exhausted after {} attempts", attempts);
        Err(QrLinkerError::conflict(format!(
            "could not allocate a unique slug after {} attempts",
            attempts
        )))
    }

    pub async fn update(
        &self,
        id: &str,
        caller: Option<&CallerIdentity>,
        mut patch: QrCodePatch,
    ) -> Result<QrCode> {
        // 先校验所有权，非所有者拿不到校验错误
        let current = self.load_owned(id, caller).await?;

        if let Some(ref name) = patch.name {
            patch.name = Some(Self::validate_name(name)?);
        }
        if let Some(ref target_url) = patch.target_url {
            patch.target_url = Some(Self::validate_target(target_url)?);
        }
        if let Some(ref description) = patch.description {
            patch.description = Some(Self::normalize_description(description.as_deref()));
        }

        if patch.is_empty() {
            return Ok(current);
        }

        let updated = self
            .store
            .update(id, &patch, Utc::now())
            .await?
            .ok_or_else(|| QrLinkerError::not_found(format!("QR code '{}' not found", id)))?;

        info!("Registry: updated '{}'", updated.slug);
        Ok(updated)
    }

    pub async fn delete(&self, id: &str, caller: Option<&CallerIdentity>) -> Result<()> {
        let code = self.load_owned(id, caller).await?;
        if !self.store.delete(id).await? {
            return Err(QrLinkerError::not_found(format!("QR code '{}' not found", id)));
        }
        info!("Registry: deleted '{}'", code.slug);
        Ok(())
    }

    pub async fn get(&self, id: &str, caller: Option<&CallerIdentity>) -> Result<QrCode> {
        self.load_owned(id, caller).await
    }

    /// 调用方的全部二维码，按创建时间倒序
    pub async fn list(&self, caller: Option<&CallerIdentity>) -> Result<Vec<QrCode>> {
        let owner = require_caller(caller)?;
        self.store.list_by_owner(&owner.owner_id).await
    }

    pub async fn stats(&self, caller: Option<&CallerIdentity>) -> Result<CodeStats> {
        self.stats_at(caller, Utc::now()).await
    }

    pub async fn stats_at(
        &self,
        caller: Option<&CallerIdentity>,
        now: DateTime<Utc>,
    ) -> Result<CodeStats> {
        let codes = self.list(caller).await?;
        Ok(CodeStats::from_codes(&codes, now))
    }

    /// 唯一不按所有者过滤的查询，供扫码解析使用
    pub async fn resolve_by_slug(&self, slug: &str) -> Result<Option<QrCode>> {
        self.store.find_by_slug(slug).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn registry() -> CodeRegistry {
        CodeRegistry::new(
            Arc::new(MemoryStorage::new()),
            RegistryOptions {
                reserved_prefixes: vec!["/api".to_string(), "/health".to_string()],
                ..Default::default()
            },
        )
    }

    fn alice() -> CallerIdentity {
        CallerIdentity::new("alice")
    }

    #[tokio::test]
    async fn test_create_generates_slug() {
        let registry = registry();
        let code = registry
            .create(Some(&alice()), CreateQrCodeRequest::new("Promo", "https://shop.example/promo"))
            .await
            .unwrap();

        assert_eq!(code.slug.len(), 8);
        assert_eq!(code.owner_id, "alice");
        assert_eq!(code.scan_count, 0);
        assert!(code.is_active);
        assert_eq!(
            registry.resolve_by_slug(&code.slug).await.unwrap().unwrap().id,
            code.id
        );
    }

    #[tokio::test]
    async fn test_create_validation() {
        let registry = registry();
        let caller = alice();

        for (name, target) in [
            ("Promo", "not a url"),
            ("Promo", "/relative"),
            ("Promo", "javascript:alert(1)"),
            ("   ", "https://example.com"),
        ] {
            let err = registry
                .create(Some(&caller), CreateQrCodeRequest::new(name, target))
                .await
                .unwrap_err();
            assert!(matches!(err, QrLinkerError::Validation(_)), "{name} {target}");
        }
    }

    #[tokio::test]
    async fn test_create_requires_caller() {
        let err = registry()
            .create(None, CreateQrCodeRequest::new("Promo", "https://example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, QrLinkerError::Authorization(_)));
    }

    #[tokio::test]
    async fn test_custom_slug_rules() {
        let registry = registry();
        let caller = alice();

        let mut req = CreateQrCodeRequest::new("Promo", "https://example.com");
        req.slug = Some("promo1".to_string());
        registry.create(Some(&caller), req.clone()).await.unwrap();

        let err = registry.create(Some(&caller), req).await.unwrap_err();
        assert!(matches!(err, QrLinkerError::Conflict(_)));

        for bad in ["api", "Health", "a b", "x/y"] {
            let mut req = CreateQrCodeRequest::new("Promo", "https://example.com");
            req.slug = Some(bad.to_string());
            let err = registry.create(Some(&caller), req).await.unwrap_err();
            assert!(matches!(err, QrLinkerError::Validation(_)), "{bad}");
        }
    }

    /// 前几次插入都冲突的存储
    struct CollidingStore {
        inner: MemoryStorage,
        collisions_left: AtomicU32,
    }

    #[async_trait]
    impl CodeStore for CollidingStore {
        async fn insert(&self, code: &QrCode) -> Result<()> {
            if self
                .collisions_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(QrLinkerError::conflict("taken"));
            }
            self.inner.insert(code).await
        }
        async fn get(&self, id: &str) -> Result<Option<QrCode>> {
            self.inner.get(id).await
        }
        async fn find_by_slug(&self, slug: &str) -> Result<Option<QrCode>> {
            self.inner.find_by_slug(slug).await
        }
        async fn update(
            &self,
            id: &str,
            patch: &QrCodePatch,
            updated_at: DateTime<Utc>,
        ) -> Result<Option<QrCode>> {
            self.inner.update(id, patch, updated_at).await
        }
        async fn delete(&self, id: &str) -> Result<bool> {
            self.inner.delete(id).await
        }
        async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<QrCode>> {
            self.inner.list_by_owner(owner_id).await
        }
        async fn add_scans(&self, updates: &[(String, u64)]) -> Result<u64> {
            self.inner.add_scans(updates).await
        }
        async fn count(&self) -> Result<u64> {
            self.inner.count().await
        }
        fn backend_config(&self) -> crate::storage::StorageConfig {
            self.inner.backend_config()
        }
        fn as_scan_sink(&self) -> Arc<dyn crate::analytics::ScanSink> {
            self.inner.as_scan_sink()
        }
    }

    fn colliding(collisions: u32, attempts: u32) -> CodeRegistry {
        CodeRegistry::new(
            Arc::new(CollidingStore {
                inner: MemoryStorage::new(),
                collisions_left: AtomicU32::new(collisions),
            }),
            RegistryOptions {
                max_slug_attempts: attempts,
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn test_generated_slug_collision_retries() {
        let registry = colliding(2, 3);
        let code = registry
            .create(Some(&alice()), CreateQrCodeRequest::new("Promo", "https://example.com"))
            .await
            .unwrap();
        assert!(registry.resolve_by_slug(&code.slug).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_generated_slug_collision_exhausted() {
        let registry = colliding(3, 3);
        let err = registry
            .create(Some(&alice()), CreateQrCodeRequest::new("Promo", "https://example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, QrLinkerError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_by_non_owner_leaves_record_unchanged() {
        let registry = registry();
        let code = registry
            .create(Some(&alice()), CreateQrCodeRequest::new("Promo", "https://a.example"))
            .await
            .unwrap();

        let patch = QrCodePatch {
            target_url: Some("https://evil.example".to_string()),
            ..Default::default()
        };
        let err = registry
            .update(&code.id, Some(&CallerIdentity::new("mallory")), patch.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, QrLinkerError::Authorization(_)));

        let err = registry.update(&code.id, None, patch).await.unwrap_err();
        assert!(matches!(err, QrLinkerError::Authorization(_)));

        let stored = registry.get(&code.id, Some(&alice())).await.unwrap();
        assert_eq!(stored.target_url, "https://a.example");
    }

    #[tokio::test]
    async fn test_update_missing_and_empty_patch() {
        let registry = registry();
        let err = registry
            .update("missing", Some(&alice()), QrCodePatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, QrLinkerError::NotFound(_)));

        let code = registry
            .create(Some(&alice()), CreateQrCodeRequest::new("Promo", "https://a.example"))
            .await
            .unwrap();
        let same = registry
            .update(&code.id, Some(&alice()), QrCodePatch::default())
            .await
            .unwrap();
        assert_eq!(same, code);
    }

    #[tokio::test]
    async fn test_update_rejects_invalid_target() {
        let registry = registry();
        let code = registry
            .create(Some(&alice()), CreateQrCodeRequest::new("Promo", "https://a.example"))
            .await
            .unwrap();
        let patch = QrCodePatch {
            target_url: Some("ftp://files.example".to_string()),
            ..Default::default()
        };
        let err = registry
            .update(&code.id, Some(&alice()), patch.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, QrLinkerError::Validation(_)));

        // 非所有者 / 无身份：即使 patch 非法也是 Authorization
        let err = registry
            .update(&code.id, Some(&CallerIdentity::new("mallory")), patch.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, QrLinkerError::Authorization(_)), "got {:?}", err);

        let err = registry.update(&code.id, None, patch).await.unwrap_err();
        assert!(matches!(err, QrLinkerError::Authorization(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_list_is_owner_scoped_and_stats() {
        let registry = registry();
        let bob = CallerIdentity::new("bob");

        assert!(registry.list(Some(&bob)).await.unwrap().is_empty());

        let first = registry
            .create(Some(&alice()), CreateQrCodeRequest::new("One", "https://a.example/1"))
            .await
            .unwrap();
        let mut inactive = CreateQrCodeRequest::new("Two", "https://a.example/2");
        inactive.is_active = false;
        registry.create(Some(&alice()), inactive).await.unwrap();
        registry
            .create(Some(&bob), CreateQrCodeRequest::new("Bob", "https://b.example"))
            .await
            .unwrap();

        let mine = registry.list(Some(&alice())).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|c| c.owner_id == "alice"));

        registry
            .store()
            .add_scans(&[(first.id.clone(), 4)])
            .await
            .unwrap();
        let stats = registry.stats(Some(&alice())).await.unwrap();
        assert_eq!(
            stats,
            CodeStats {
                total_codes: 2,
                active_codes: 1,
                total_scans: 4,
            }
        );
    }

    #[tokio::test]
    async fn test_delete() {
        let registry = registry();
        let code = registry
            .create(Some(&alice()), CreateQrCodeRequest::new("Promo", "https://a.example"))
            .await
            .unwrap();

        let err = registry
            .delete(&code.id, Some(&CallerIdentity::new("bob")))
            .await
            .unwrap_err();
        assert!(matches!(err, QrLinkerError::Authorization(_)));

        registry.delete(&code.id, Some(&alice())).await.unwrap();
        assert!(registry.resolve_by_slug(&code.slug).await.unwrap().is_none());
        assert!(matches!(
            registry.delete(&code.id, Some(&alice())).await,
            Err(QrLinkerError::NotFound(_))
        ));
    }
}

//! Resolution engine
//!
//! slug -> 目标地址。每次查询都直接读存储，没有缓存，所以 update 返回之后的
//! 下一次扫码一定看到新目标。

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, trace, warn};

use crate::analytics::ScanCounter;
use crate::config::RedirectConfig;
use crate::errors::{QrLinkerError, Result};
use crate::storage::{CodeStatus, CodeStore, QrCode};
use crate::utils::is_valid_slug;

/// 跳转到 fallback 的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    Inactive,
    Expired,
}

/// 一次解析的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// 有效二维码，跳转到当前目标
    Target { code: QrCode, url: String },
    /// 二维码存在但已停用或过期
    Fallback {
        code: QrCode,
        url: String,
        reason: FallbackReason,
    },
    /// slug 不存在（或格式非法），不计数
    NotFound,
}

impl Resolution {
    /// 跳转地址；NotFound 时为 None
    pub fn location(&self) -> Option<&str> {
        match self {
            Self::Target { url, .. } | Self::Fallback { url, .. } => Some(url),
            Self::NotFound => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolutionOptions {
    pub fallback_url: String,
    pub lookup_timeout: Duration,
}

impl From<&RedirectConfig> for ResolutionOptions {
    fn from(config: &RedirectConfig) -> Self {
        Self {
            fallback_url: config.fallback_url.clone(),
            lookup_timeout: Duration::from_millis(config.lookup_timeout_ms.max(1)),
        }
    }
}

impl Default for ResolutionOptions {
    fn default() -> Self {
        Self::from(&RedirectConfig::default())
    }
}

pub struct ResolutionEngine {
    store: Arc<dyn CodeStore>,
    counter: Arc<dyn ScanCounter>,
    options: ResolutionOptions,
}

impl ResolutionEngine {
    pub fn new(
        store: Arc<dyn CodeStore>,
        counter: Arc<dyn ScanCounter>,
        options: ResolutionOptions,
    ) -> Self {
        Self {
            store,
            counter,
            options,
        }
    }

    pub fn fallback_url(&self) -> &str {
        &self.options.fallback_url
    }

    pub async fn resolve(&self, slug: &str) -> Result<Resolution> {
        self.resolve_at(slug, Utc::now()).await
    }

    /// 在指定时间点解析 slug
    ///
    /// 存储超时或不可用时返回 `TransientStorage`，不会挂起调用方。
    pub async fn resolve_at(&self, slug: &str, now: DateTime<Utc>) -> Result<Resolution> {
        self.evaluate(slug, now, true).await
    }

    /// 与 `resolve` 相同的判定，但不计数（HEAD 请求、链接预览）
    pub async fn inspect(&self, slug: &str) -> Result<Resolution> {
        self.evaluate(slug, Utc::now(), false).await
    }

    async fn evaluate(&self, slug: &str, now: DateTime<Utc>, count_scan: bool) -> Result<Resolution> {
        if !is_valid_slug(slug) {
            trace!("Invalid slug rejected: {}", slug);
            return Ok(Resolution::NotFound);
        }

        let lookup = tokio::time::timeout(self.options.lookup_timeout, self.store.find_by_slug(slug))
            .await
            .map_err(|_| {
                warn!(
                    "Lookup for '{}' timed out after {:?}",
                    slug, self.options.lookup_timeout
                );
                QrLinkerError::transient_storage(format!("lookup for '{}' timed out", slug))
            })?;

        let code = match lookup {
            Ok(Some(code)) => code,
            Ok(None) => {
                debug!("Slug not found: {}", slug);
                return Ok(Resolution::NotFound);
            }
            Err(e) => {
                warn!("Lookup for '{}' failed: {}", slug, e);
                return Err(match e {
                    QrLinkerError::TransientStorage(_) => e,
                    other => QrLinkerError::transient_storage(other.message().to_string()),
                });
            }
        };

        // 停用 / 过期的扫码同样计数
        if count_scan {
            self.counter.record_scan(&code.id);
        }

        let resolution = match code.status_at(now) {
            CodeStatus::Active => Resolution::Target {
                url: code.target_url.clone(),
                code,
            },
            CodeStatus::Inactive => Resolution::Fallback {
                url: self.options.fallback_url.clone(),
                reason: FallbackReason::Inactive,
                code,
            },
            CodeStatus::Expired => Resolution::Fallback {
                url: self.options.fallback_url.clone(),
                reason: FallbackReason::Expired,
                code,
            },
        };

        Ok(resolution)
    }
}

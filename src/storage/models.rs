use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 动态二维码记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrCode {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub target_url: String,
    pub owner_id: String,
    pub is_active: bool,
    pub valid_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scan_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 展示用状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeStatus {
    Active,
    Inactive,
    Expired,
}

impl QrCode {
    /// `valid_until` 等于 `now` 视为已过期
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.valid_until.is_some_and(|until| until <= now)
    }

    /// is_active AND (valid_until 未设置 OR valid_until > now)
    pub fn is_effectively_active(&self, now: DateTime<Utc>) -> bool {
        self.is_active && !self.is_expired_at(now)
    }

    pub fn status_at(&self, now: DateTime<Utc>) -> CodeStatus {
        if !self.is_active {
            CodeStatus::Inactive
        } else if self.is_expired_at(now) {
            CodeStatus::Expired
        } else {
            CodeStatus::Active
        }
    }
}

/// 所有者可修改的字段
///
/// `None` 表示保持不变；`valid_until` / `description` 的 `Some(None)` 表示清除。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QrCodePatch {
    pub target_url: Option<String>,
    pub is_active: Option<bool>,
    pub valid_until: Option<Option<DateTime<Utc>>>,
    pub name: Option<String>,
    pub description: Option<Option<String>>,
}

impl QrCodePatch {
    pub fn is_empty(&self) -> bool {
        self.target_url.is_none()
            && self.is_active.is_none()
            && self.valid_until.is_none()
            && self.name.is_none()
            && self.description.is_none()
    }

    /// 应用到内存中的记录（内存存储和测试使用）
    pub fn apply_to(&self, code: &mut QrCode, updated_at: DateTime<Utc>) {
        if let Some(ref target_url) = self.target_url {
            code.target_url = target_url.clone();
        }
        if let Some(is_active) = self.is_active {
            code.is_active = is_active;
        }
        if let Some(valid_until) = self.valid_until {
            code.valid_until = valid_until;
        }
        if let Some(ref name) = self.name {
            code.name = name.clone();
        }
        if let Some(ref description) = self.description {
            code.description = description.clone();
        }
        code.updated_at = updated_at;
    }
}

/// 所有者维度的汇总统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeStats {
    pub total_codes: u64,
    pub active_codes: u64,
    pub total_scans: u64,
}

impl CodeStats {
    pub fn from_codes<'a>(codes: impl IntoIterator<Item = &'a QrCode>, now: DateTime<Utc>) -> Self {
        codes.into_iter().fold(Self::default(), |mut stats, code| {
            stats.total_codes += 1;
            if code.is_effectively_active(now) {
                stats.active_codes += 1;
            }
            stats.total_scans = stats.total_scans.saturating_add(code.scan_count);
            stats
        })
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct StorageConfig {
    pub storage_type: String,
    pub support_scan_count: bool,
}

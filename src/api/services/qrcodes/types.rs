//! QR code API 类型定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::services::QrRenderer;
use crate::storage::{CodeStats, CodeStatus, QrCode};

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    pub data: Option<T>,
}

/// 区分"字段缺失"和"显式 null"
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PostNewQrCode {
    pub name: String,
    pub target_url: String,
    #[serde(default)]
    pub description: Option<String>,
    /// 自定义 slug，缺省时自动生成
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    /// RFC3339、YYYY-MM-DD 或相对时间（如 "30d"）
    #[serde(default)]
    pub valid_until: Option<String>,
}

/// 部分更新；`valid_until` / `description` 传 null 或空字符串表示清除
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct UpdateQrCode {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub target_url: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub valid_until: Option<Option<String>>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct QrCodeResponse {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub target_url: String,
    pub is_active: bool,
    pub status: CodeStatus,
    pub valid_until: Option<String>,
    pub scan_count: u64,
    pub created_at: String,
    pub updated_at: String,
    /// 二维码中编码的公开地址
    pub qr_url: String,
    /// 外部渲染服务生成的图片地址
    pub image_url: String,
}

impl QrCodeResponse {
    pub fn build(code: QrCode, renderer: &QrRenderer, now: DateTime<Utc>) -> Self {
        Self {
            status: code.status_at(now),
            qr_url: renderer.public_url(&code.slug),
            image_url: renderer.image_url(&code.slug),
            valid_until: code.valid_until.map(|dt| dt.to_rfc3339()),
            created_at: code.created_at.to_rfc3339(),
            updated_at: code.updated_at.to_rfc3339(),
            id: code.id,
            slug: code.slug,
            name: code.name,
            description: code.description,
            target_url: code.target_url,
            is_active: code.is_active,
            scan_count: code.scan_count,
        }
    }
}

/// 统计卡片
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct StatsResponse {
    pub total_codes: u64,
    pub active_codes: u64,
    pub total_scans: u64,
}

impl From<CodeStats> for StatsResponse {
    fn from(stats: CodeStats) -> Self {
        Self {
            total_codes: stats.total_codes,
            active_codes: stats.active_codes,
            total_scans: stats.total_scans,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DeletedResponse {
    pub id: String,
}

// ============ 健康检查相关类型 ============

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HealthStorageBackend {
    pub storage_type: String,
    pub support_scan_count: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HealthStorageCheck {
    pub status: String,
    pub codes_count: Option<u64>,
    pub backend: HealthStorageBackend,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HealthScanCounterCheck {
    pub pending_scans: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HealthChecks {
    pub storage: HealthStorageCheck,
    pub scan_counter: HealthScanCounterCheck,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub uptime: u64,
    pub checks: HealthChecks,
    pub response_time_ms: u64,
}

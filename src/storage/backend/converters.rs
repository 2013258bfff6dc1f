use sea_orm::ActiveValue::{NotSet, Set};

use crate::storage::{QrCode, QrCodePatch};
use migration::entities::qr_code;

/// 将 Sea-ORM Model 转换为 QrCode
pub fn model_to_qr_code(model: qr_code::Model) -> QrCode {
    QrCode {
        id: model.id,
        slug: model.slug,
        name: model.name,
        description: model.description,
        target_url: model.target_url,
        owner_id: model.owner_id,
        is_active: model.is_active,
        valid_until: model.valid_until,
        scan_count: model.scan_count.max(0) as u64,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

/// 新建记录用的 ActiveModel
pub fn qr_code_to_active_model(code: &QrCode) -> qr_code::ActiveModel {
    qr_code::ActiveModel {
        id: Set(code.id.clone()),
        slug: Set(code.slug.clone()),
        name: Set(code.name.clone()),
        description: Set(code.description.clone()),
        target_url: Set(code.target_url.clone()),
        owner_id: Set(code.owner_id.clone()),
        is_active: Set(code.is_active),
        valid_until: Set(code.valid_until),
        scan_count: Set(code.scan_count.min(i64::MAX as u64) as i64),
        created_at: Set(code.created_at),
        updated_at: Set(code.updated_at),
    }
}

/// 把 patch 写进 ActiveModel，未给出的字段保持 NotSet
///
/// id / slug / owner_id / scan_count / created_at 永远不会被写。
pub fn apply_patch(
    id: &str,
    patch: &QrCodePatch,
    updated_at: chrono::DateTime<chrono::Utc>,
) -> qr_code::ActiveModel {
    qr_code::ActiveModel {
        id: Set(id.to_string()),
        slug: NotSet,
        name: patch.name.clone().map_or(NotSet, Set),
        description: patch.description.clone().map_or(NotSet, Set),
        target_url: patch.target_url.clone().map_or(NotSet, Set),
        owner_id: NotSet,
        is_active: patch.is_active.map_or(NotSet, Set),
        valid_until: patch.valid_until.map_or(NotSet, Set),
        scan_count: NotSet,
        created_at: NotSet,
        updated_at: Set(updated_at),
    }
}

//! 统一 API 错误码定义

use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::errors::QrLinkerError;

/// API 错误码
///
/// 使用 serde_repr 序列化为数字，按千位分域：
/// - 0: 成功
/// - 1000-1099: 通用错误
/// - 2000-2099: 认证错误
/// - 3000-3099: 二维码错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    // 通用错误 1000-1099
    BadRequest = 1000,
    Unauthorized = 1001,
    Forbidden = 1003,
    NotFound = 1004,
    InternalServerError = 1005,
    ServiceUnavailable = 1030,

    // 认证错误 2000-2099
    TokenInvalid = 2002,

    // 二维码错误 3000-3099
    QrCodeNotFound = 3000,
    SlugAlreadyExists = 3001,
    QrCodeInvalidInput = 3002,
    QrCodeInvalidValidUntil = 3003,
    QrCodeDatabaseError = 3005,
}

impl From<&QrLinkerError> for ErrorCode {
    fn from(err: &QrLinkerError) -> Self {
        match err {
            QrLinkerError::Validation(_) => ErrorCode::QrCodeInvalidInput,
            QrLinkerError::Conflict(_) => ErrorCode::SlugAlreadyExists,
            QrLinkerError::NotFound(_) => ErrorCode::QrCodeNotFound,
            QrLinkerError::Authorization(_) => ErrorCode::Forbidden,
            QrLinkerError::TransientStorage(_) => ErrorCode::ServiceUnavailable,
            QrLinkerError::DatabaseConfig(_)
            | QrLinkerError::DatabaseConnection(_)
            | QrLinkerError::DatabaseOperation(_) => ErrorCode::QrCodeDatabaseError,
            QrLinkerError::Serialization(_) | QrLinkerError::FileOperation(_) => {
                ErrorCode::InternalServerError
            }
        }
    }
}

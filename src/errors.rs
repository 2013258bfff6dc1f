use std::fmt;

use actix_web::http::StatusCode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QrLinkerError {
    Validation(String),
    Conflict(String),
    NotFound(String),
    Authorization(String),
    TransientStorage(String),
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    Serialization(String),
    FileOperation(String),
}

impl QrLinkerError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            QrLinkerError::Validation(_) => "E001",
            QrLinkerError::Conflict(_) => "E002",
            QrLinkerError::NotFound(_) => "E003",
            QrLinkerError::Authorization(_) => "E004",
            QrLinkerError::TransientStorage(_) => "E005",
            QrLinkerError::DatabaseConfig(_) => "E006",
            QrLinkerError::DatabaseConnection(_) => "E007",
            QrLinkerError::DatabaseOperation(_) => "E008",
            QrLinkerError::Serialization(_) => "E009",
            QrLinkerError::FileOperation(_) => "E010",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            QrLinkerError::Validation(_) => "Validation Error",
            QrLinkerError::Conflict(_) => "Conflict",
            QrLinkerError::NotFound(_) => "Resource Not Found",
            QrLinkerError::Authorization(_) => "Authorization Error",
            QrLinkerError::TransientStorage(_) => "Storage Temporarily Unavailable",
            QrLinkerError::DatabaseConfig(_) => "Database Configuration Error",
            QrLinkerError::DatabaseConnection(_) => "Database Connection Error",
            QrLinkerError::DatabaseOperation(_) => "Database Operation Error",
            QrLinkerError::Serialization(_) => "Serialization Error",
            QrLinkerError::FileOperation(_) => "File Operation Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            QrLinkerError::Validation(msg)
            | QrLinkerError::Conflict(msg)
            | QrLinkerError::NotFound(msg)
            | QrLinkerError::Authorization(msg)
            | QrLinkerError::TransientStorage(msg)
            | QrLinkerError::DatabaseConfig(msg)
            | QrLinkerError::DatabaseConnection(msg)
            | QrLinkerError::DatabaseOperation(msg)
            | QrLinkerError::Serialization(msg)
            | QrLinkerError::FileOperation(msg) => msg,
        }
    }

    /// 映射到 HTTP 状态码
    pub fn http_status(&self) -> StatusCode {
        match self {
            QrLinkerError::Validation(_) => StatusCode::BAD_REQUEST,
            QrLinkerError::Conflict(_) => StatusCode::CONFLICT,
            QrLinkerError::NotFound(_) => StatusCode::NOT_FOUND,
            QrLinkerError::Authorization(_) => StatusCode::FORBIDDEN,
            QrLinkerError::TransientStorage(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 调用方是否可以稍后重试
    pub fn is_retryable(&self) -> bool {
        matches!(self, QrLinkerError::TransientStorage(_))
    }

    /// 格式化为彩色输出（用于 Server 模式）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出（用于 CLI 模式）
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for QrLinkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for QrLinkerError {}

// 便捷的构造函数
impl QrLinkerError {
    pub fn validation<T: Into<String>>(msg: T) -> Self {
        QrLinkerError::Validation(msg.into())
    }

    pub fn conflict<T: Into<String>>(msg: T) -> Self {
        QrLinkerError::Conflict(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        QrLinkerError::NotFound(msg.into())
    }

    pub fn authorization<T: Into<String>>(msg: T) -> Self {
        QrLinkerError::Authorization(msg.into())
    }

    pub fn transient_storage<T: Into<String>>(msg: T) -> Self {
        QrLinkerError::TransientStorage(msg.into())
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        QrLinkerError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        QrLinkerError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        QrLinkerError::DatabaseOperation(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        QrLinkerError::Serialization(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        QrLinkerError::FileOperation(msg.into())
    }
}

impl From<sea_orm::DbErr> for QrLinkerError {
    fn from(err: sea_orm::DbErr) -> Self {
        use sea_orm::SqlErr;

        if let Some(SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
            return QrLinkerError::Conflict(detail);
        }
        if crate::storage::backend::retry::is_retryable_error(&err) {
            return QrLinkerError::TransientStorage(err.to_string());
        }
        QrLinkerError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for QrLinkerError {
    fn from(err: std::io::Error) -> Self {
        QrLinkerError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for QrLinkerError {
    fn from(err: serde_json::Error) -> Self {
        QrLinkerError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for QrLinkerError {
    fn from(err: chrono::ParseError) -> Self {
        QrLinkerError::Validation(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, QrLinkerError>;

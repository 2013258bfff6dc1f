//! URL 验证模块
//!
//! 二维码目标地址必须是带 host 的绝对 http(s) URL。

use url::Url;

/// URL 验证错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlValidationError {
    EmptyUrl,
    TooLong(usize),
    DangerousProtocol(String),
    InvalidProtocol(String),
    MissingHost,
    InvalidFormat(String),
}

impl std::fmt::Display for UrlValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyUrl => write!(f, "URL cannot be empty"),
            Self::TooLong(len) => write!(
                f,
                "URL is too long ({} bytes, max {})",
                len, MAX_URL_LENGTH
            ),
            Self::DangerousProtocol(proto) => write!(f, "Dangerous protocol blocked: {}", proto),
            Self::InvalidProtocol(proto) => write!(
                f,
                "Invalid protocol: {}. Only http:// and https:// are allowed",
                proto
            ),
            Self::MissingHost => write!(f, "URL must contain a host"),
            Self::InvalidFormat(msg) => write!(f, "Invalid URL format: {}", msg),
        }
    }
}

impl std::error::Error for UrlValidationError {}

/// 目标地址最大长度
pub const MAX_URL_LENGTH: usize = 2048;

const DANGEROUS_PROTOCOLS: &[&str] = &["javascript", "data", "file", "vbscript", "about", "blob"];

/// 验证并解析目标地址
///
/// 相对地址（如 `/promo`）直接判为格式错误，不会被当作 http 处理。
pub fn validate_url(raw: &str) -> Result<Url, UrlValidationError> {
    let raw = raw.trim();

    if raw.is_empty() {
        return Err(UrlValidationError::EmptyUrl);
    }
    if raw.len() > MAX_URL_LENGTH {
        return Err(UrlValidationError::TooLong(raw.len()));
    }

    let parsed = Url::parse(raw).map_err(|e| UrlValidationError::InvalidFormat(e.to_string()))?;

    let scheme = parsed.scheme();
    if DANGEROUS_PROTOCOLS.contains(&scheme) {
        return Err(UrlValidationError::DangerousProtocol(format!("{}:", scheme)));
    }
    if scheme != "http" && scheme != "https" {
        return Err(UrlValidationError::InvalidProtocol(format!("{}:", scheme)));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(UrlValidationError::MissingHost);
    }

    Ok(parsed)
}

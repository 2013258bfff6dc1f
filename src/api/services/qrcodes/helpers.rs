//! QR code API 帮助函数

use actix_web::http::StatusCode;
use actix_web::{HttpMessage, HttpRequest, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::errors::QrLinkerError;
use crate::services::CallerIdentity;
use crate::utils::TimeParser;

use super::error_code::ErrorCode;
use super::types::ApiResponse;

/// 解析 valid_until；空字符串表示清除
pub fn parse_valid_until(
    input: &str,
    now: DateTime<Utc>,
) -> Result<Option<DateTime<Utc>>, String> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    TimeParser::parse_valid_until(input, now).map(Some).map_err(|e| {
        format!(
            "Invalid valid_until '{}': {}. Use RFC3339, YYYY-MM-DD or a relative format like '30d'",
            input, e
        )
    })
}

/// 认证中间件写入的调用方身份
pub fn caller_from(req: &HttpRequest) -> Option<CallerIdentity> {
    req.extensions().get::<CallerIdentity>().cloned()
}

pub fn json_response<T: Serialize>(
    status: StatusCode,
    code: ErrorCode,
    message: impl Into<String>,
    data: Option<T>,
) -> HttpResponse {
    HttpResponse::build(status)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(ApiResponse {
            code: code as i32,
            message: message.into(),
            data,
        })
}

pub fn success_response<T: Serialize>(data: T) -> HttpResponse {
    json_response(StatusCode::OK, ErrorCode::Success, "OK", Some(data))
}

pub fn created_response<T: Serialize>(data: T) -> HttpResponse {
    json_response(StatusCode::CREATED, ErrorCode::Success, "Created", Some(data))
}

pub fn error_response(status: StatusCode, error_code: ErrorCode, message: &str) -> HttpResponse {
    json_response::<()>(status, error_code, message, None)
}

/// 从 QrLinkerError 构建错误响应（自动映射 HTTP 状态码和 ErrorCode）
pub fn error_from_qrlinker(err: &QrLinkerError) -> HttpResponse {
    let mut response = error_response(err.http_status(), ErrorCode::from(err), err.message());
    if matches!(err, QrLinkerError::TransientStorage(_)) {
        response.headers_mut().insert(
            actix_web::http::header::RETRY_AFTER,
            actix_web::http::header::HeaderValue::from_static("1"),
        );
    }
    response
}

/// 统一 Result → HttpResponse 转换
pub fn api_result<T, E>(result: Result<T, E>) -> HttpResponse
where
    T: Serialize,
    E: Into<QrLinkerError>,
{
    match result {
        Ok(data) => success_response(data),
        Err(e) => error_from_qrlinker(&e.into()),
    }
}

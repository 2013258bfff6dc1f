//! QR code CRUD 端点
//!
//! 所有端点都经过 `OwnerAuth`，调用方身份从 request extensions 读取，
//! 所有权校验由 `CodeRegistry` 完成。

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, web};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, trace};

use crate::services::{CodeRegistry, CreateQrCodeRequest, QrRenderer};
use crate::storage::QrCodePatch;

use super::error_code::ErrorCode;
use super::helpers::{
    api_result, caller_from, created_response, error_from_qrlinker, error_response,
    parse_valid_until, success_response,
};
use super::types::{
    DeletedResponse, PostNewQrCode, QrCodeResponse, StatsResponse, UpdateQrCode,
};

/// 列出调用方的全部二维码（新的在前）
pub async fn list_qrcodes(
    req: HttpRequest,
    registry: web::Data<Arc<CodeRegistry>>,
    renderer: web::Data<Arc<QrRenderer>>,
) -> HttpResponse {
    let caller = caller_from(&req);
    let now = Utc::now();

    match registry.list(caller.as_ref()).await {
        Ok(codes) => {
            trace!("API: returning {} QR codes", codes.len());
            let data: Vec<QrCodeResponse> = codes
                .into_iter()
                .map(|code| QrCodeResponse::build(code, &renderer, now))
                .collect();
            success_response(data)
        }
        Err(e) => error_from_qrlinker(&e),
    }
}

pub async fn post_qrcode(
    req: HttpRequest,
    body: web::Json<PostNewQrCode>,
    registry: web::Data<Arc<CodeRegistry>>,
    renderer: web::Data<Arc<QrRenderer>>,
) -> HttpResponse {
    let body = body.into_inner();
    let now = Utc::now();

    let valid_until = match body.valid_until.as_deref() {
        Some(raw) => match parse_valid_until(raw, now) {
            Ok(parsed) => parsed,
            Err(msg) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    ErrorCode::QrCodeInvalidValidUntil,
                    &msg,
                );
            }
        },
        None => None,
    };

    let request = CreateQrCodeRequest {
        name: body.name,
        target_url: body.target_url,
        description: body.description,
        slug: body.slug,
        is_active: body.is_active.unwrap_or(true),
        valid_until,
    };

    match registry.create(caller_from(&req).as_ref(), request).await {
        Ok(code) => {
            info!("API: created QR code '{}'", code.slug);
            created_response(QrCodeResponse::build(code, &renderer, now))
        }
        Err(e) => error_from_qrlinker(&e),
    }
}

pub async fn get_qrcode(
    req: HttpRequest,
    path: web::Path<String>,
    registry: web::Data<Arc<CodeRegistry>>,
    renderer: web::Data<Arc<QrRenderer>>,
) -> HttpResponse {
    let id = path.into_inner();
    let result = registry
        .get(&id, caller_from(&req).as_ref())
        .await
        .map(|code| QrCodeResponse::build(code, &renderer, Utc::now()));
    api_result(result)
}

pub async fn update_qrcode(
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<UpdateQrCode>,
    registry: web::Data<Arc<CodeRegistry>>,
    renderer: web::Data<Arc<QrRenderer>>,
) -> HttpResponse {
    let id = path.into_inner();
    let body = body.into_inner();
    let now = Utc::now();

    let valid_until = match body.valid_until {
        Some(Some(raw)) => match parse_valid_until(&raw, now) {
            Ok(parsed) => Some(parsed),
            Err(msg) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    ErrorCode::QrCodeInvalidValidUntil,
                    &msg,
                );
            }
        },
        Some(None) => Some(None),
        None => None,
    };

    let patch = QrCodePatch {
        target_url: body.target_url,
        is_active: body.is_active,
        valid_until,
        name: body.name,
        description: body.description,
    };

    let result = registry
        .update(&id, caller_from(&req).as_ref(), patch)
        .await
        .map(|code| QrCodeResponse::build(code, &renderer, Utc::now()));
    api_result(result)
}

pub async fn delete_qrcode(
    req: HttpRequest,
    path: web::Path<String>,
    registry: web::Data<Arc<CodeRegistry>>,
) -> HttpResponse {
    let id = path.into_inner();
    let result = registry
        .delete(&id, caller_from(&req).as_ref())
        .await
        .map(|_| DeletedResponse { id });
    api_result(result)
}

/// 统计卡片：总数、有效数、总扫码数
pub async fn get_stats(req: HttpRequest, registry: web::Data<Arc<CodeRegistry>>) -> HttpResponse {
    let result = registry
        .stats(caller_from(&req).as_ref())
        .await
        .map(StatsResponse::from);
    api_result(result)
}

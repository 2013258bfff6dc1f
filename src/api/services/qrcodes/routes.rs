//! QR code API 路由

use actix_web::web;

use super::qrcode_crud::{
    delete_qrcode, get_qrcode, get_stats, list_qrcodes, post_qrcode, update_qrcode,
};

/// `/qrcodes`
///
/// - GET /qrcodes - 列表
/// - POST /qrcodes - 创建
/// - GET /qrcodes/stats - 统计（必须在 /{id} 之前）
/// - GET /qrcodes/{id} - 单个
/// - PUT /qrcodes/{id} - 部分更新
/// - DELETE /qrcodes/{id} - 删除
pub fn qrcode_routes() -> actix_web::Scope {
    web::scope("/qrcodes")
        .route("", web::get().to(list_qrcodes))
        .route("", web::post().to(post_qrcode))
        .route("/stats", web::get().to(get_stats))
        .route("/{id}", web::get().to(get_qrcode))
        .route("/{id}", web::put().to(update_qrcode))
        .route("/{id}", web::delete().to(delete_qrcode))
}

//! QR code 管理 API
//!
//! 面向仪表盘的 JSON 接口，全部按所有者隔离。

pub mod error_code;
mod helpers;
mod qrcode_crud;
pub mod routes;
mod types;

pub use types::*;

pub use helpers::{
    api_result, caller_from, error_from_qrlinker, error_response, parse_valid_until,
    success_response,
};

pub use error_code::ErrorCode;

pub use qrcode_crud::{
    delete_qrcode, get_qrcode, get_stats, list_qrcodes, post_qrcode, update_qrcode,
};

pub use routes::qrcode_routes;

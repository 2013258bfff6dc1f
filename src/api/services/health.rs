use actix_web::{HttpResponse, Responder, web};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, trace};

use crate::analytics::ScanCounter;
use crate::api::services::qrcodes::{
    ApiResponse, ErrorCode, HealthChecks, HealthResponse, HealthScanCounterCheck,
    HealthStorageBackend, HealthStorageCheck,
};
use crate::storage::CodeStore;
use crate::utils::TimeParser;

const STORAGE_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

// 应用启动时间
#[derive(Clone, Debug)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

impl AppStartTime {
    pub fn now() -> Self {
        Self {
            start_datetime: chrono::Utc::now(),
        }
    }
}

/// Health Service
///
/// 直接访问 store 和计数器，不经过 registry（没有调用方身份）。
pub struct HealthService;

impl HealthService {
    async fn check_storage(store: &Arc<dyn CodeStore>) -> HealthStorageCheck {
        let backend_config = store.backend_config();
        let backend = HealthStorageBackend {
            storage_type: backend_config.storage_type,
            support_scan_count: backend_config.support_scan_count,
        };

        match tokio::time::timeout(STORAGE_CHECK_TIMEOUT, store.count()).await {
            Ok(Ok(count)) => {
                trace!("Storage health check passed, {} QR codes found", count);
                HealthStorageCheck {
                    status: "healthy".to_string(),
                    codes_count: Some(count),
                    backend,
                    error: None,
                }
            }
            Ok(Err(e)) => {
                error!("Storage health check failed: {}", e);
                HealthStorageCheck {
                    status: "unhealthy".to_string(),
                    codes_count: None,
                    backend,
                    error: Some(format!("database error: {}", e)),
                }
            }
            Err(_) => {
                error!("Storage health check timeout");
                HealthStorageCheck {
                    status: "unhealthy".to_string(),
                    codes_count: None,
                    backend,
                    error: Some("timeout".to_string()),
                }
            }
        }
    }

    pub async fn health_check(
        store: web::Data<Arc<dyn CodeStore>>,
        counter: web::Data<Arc<dyn ScanCounter>>,
        app_start_time: web::Data<AppStartTime>,
    ) -> impl Responder {
        let start_time = Instant::now();
        trace!("Received health check request");

        let storage_status = Self::check_storage(store.get_ref()).await;
        let is_healthy = storage_status.status == "healthy";

        let now = chrono::Utc::now();
        let uptime_human = TimeParser::format_duration_human(app_start_time.start_datetime, now);
        let uptime_seconds = (now - app_start_time.start_datetime).num_seconds().max(0) as u64;

        let health_data = HealthResponse {
            status: if is_healthy { "healthy" } else { "unhealthy" }.to_string(),
            timestamp: now.to_rfc3339(),
            uptime: uptime_seconds,
            checks: HealthChecks {
                storage: storage_status,
                scan_counter: HealthScanCounterCheck {
                    pending_scans: counter.pending(),
                },
            },
            response_time_ms: start_time.elapsed().as_millis() as u64,
        };

        let (status, code, message) = if is_healthy {
            (actix_web::http::StatusCode::OK, ErrorCode::Success, "OK")
        } else {
            (
                actix_web::http::StatusCode::SERVICE_UNAVAILABLE,
                ErrorCode::ServiceUnavailable,
                "Service Unavailable",
            )
        };

        info!(
            "Health check completed in {:?}, status: {}, uptime: {}",
            start_time.elapsed(),
            health_data.status,
            uptime_human
        );

        HttpResponse::build(status)
            .append_header(("Content-Type", "application/json; charset=utf-8"))
            .json(ApiResponse {
                code: code as i32,
                message: message.to_string(),
                data: Some(health_data),
            })
    }

    /// 就绪检查：存储可用才返回 200
    pub async fn readiness_check(store: web::Data<Arc<dyn CodeStore>>) -> impl Responder {
        trace!("Received readiness check request");

        match tokio::time::timeout(STORAGE_CHECK_TIMEOUT, store.count()).await {
            Ok(Ok(_)) => HttpResponse::Ok()
                .append_header(("Content-Type", "text/plain"))
                .body("OK"),
            _ => HttpResponse::ServiceUnavailable()
                .append_header(("Content-Type", "text/plain"))
                .body("Storage Unavailable"),
        }
    }

    // 活跃性检查
    pub async fn liveness_check() -> impl Responder {
        trace!("Received liveness check request");

        HttpResponse::NoContent().finish()
    }
}

/// Health 路由配置
pub fn health_routes() -> actix_web::Scope {
    web::scope("")
        .route("", web::get().to(HealthService::health_check))
        .route("", web::head().to(HealthService::health_check))
        .route("/ready", web::get().to(HealthService::readiness_check))
        .route("/ready", web::head().to(HealthService::readiness_check))
        .route("/live", web::get().to(HealthService::liveness_check))
        .route("/live", web::head().to(HealthService::liveness_check))
}

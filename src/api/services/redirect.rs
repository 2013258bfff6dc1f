//! 扫码重定向入口
//!
//! `GET /{slug}` -> ResolutionEngine -> 3xx。这里只负责把解析结果翻译成 HTTP，
//! 计数和状态判断都在 engine 里完成。

use std::borrow::Cow;
use std::sync::Arc;

use actix_web::http::{Method, StatusCode};
use actix_web::http::header::{CACHE_CONTROL, CONTENT_TYPE, LOCATION, RETRY_AFTER};
use actix_web::{HttpRequest, HttpResponse, web};
use tracing::{debug, error, trace};

use crate::config::{NotFoundBehavior, RedirectConfig};
use crate::services::{Resolution, ResolutionEngine};

/// 重定向策略（启动时从配置构建，注入为 app_data）
#[derive(Debug, Clone)]
pub struct RedirectPolicy {
    /// 有效目标使用的状态码
    pub status: StatusCode,
    pub not_found: NotFoundBehavior,
    pub utm_passthrough: bool,
}

impl From<&RedirectConfig> for RedirectPolicy {
    fn from(config: &RedirectConfig) -> Self {
        Self {
            status: StatusCode::from_u16(config.status.status_code()).unwrap_or(StatusCode::FOUND),
            not_found: config.not_found,
            utm_passthrough: config.utm_passthrough,
        }
    }
}

impl Default for RedirectPolicy {
    fn default() -> Self {
        Self::from(&RedirectConfig::default())
    }
}

pub struct RedirectService {}

impl RedirectService {
    pub async fn handle_redirect(
        req: HttpRequest,
        path: web::Path<String>,
        engine: web::Data<Arc<ResolutionEngine>>,
        policy: web::Data<RedirectPolicy>,
    ) -> HttpResponse {
        let slug = path.into_inner();

        if slug.is_empty() {
            trace!("Empty slug, redirecting to fallback");
            return Self::redirect(StatusCode::FOUND, engine.fallback_url());
        }

        // HEAD 只探测，不算扫码
        let resolution = if req.method() == Method::HEAD {
            engine.inspect(&slug).await
        } else {
            engine.resolve(&slug).await
        };

        match resolution {
            Ok(Resolution::Target { url, .. }) => {
                let target = Self::build_target_url(&req, &url, policy.utm_passthrough);
                Self::redirect(policy.status, &target)
            }
            Ok(Resolution::Fallback { url, reason, .. }) => {
                debug!("Slug '{}' falls back ({:?})", slug, reason);
                // 状态随时可能恢复，永远用临时跳转
                Self::redirect(StatusCode::FOUND, &url)
            }
            Ok(Resolution::NotFound) => match policy.not_found {
                NotFoundBehavior::NotFound => Self::not_found_response(),
                NotFoundBehavior::Fallback => Self::redirect(StatusCode::FOUND, engine.fallback_url()),
            },
            Err(e) => {
                error!("Resolution failed for '{}': {}", slug, e);
                Self::unavailable_response()
            }
        }
    }

    fn redirect(status: StatusCode, location: &str) -> HttpResponse {
        let mut builder = HttpResponse::build(status);
        builder.insert_header((LOCATION, location));
        if status != StatusCode::MOVED_PERMANENTLY {
            // 目标可被所有者随时修改
            builder.insert_header((CACHE_CONTROL, "no-store"));
        }
        builder.finish()
    }

    #[inline]
    fn not_found_response() -> HttpResponse {
        HttpResponse::build(StatusCode::NOT_FOUND)
            .insert_header((CONTENT_TYPE, "text/html; charset=utf-8"))
            .insert_header((CACHE_CONTROL, "public, max-age=60"))
            .body("Not Found")
    }

    #[inline]
    fn unavailable_response() -> HttpResponse {
        HttpResponse::build(StatusCode::SERVICE_UNAVAILABLE)
            .insert_header((CONTENT_TYPE, "text/html; charset=utf-8"))
            .insert_header((RETRY_AFTER, "1"))
            .insert_header((CACHE_CONTROL, "no-store"))
            .body("Service Unavailable")
    }

    /// 构建目标 URL，按需透传 UTM 参数
    #[inline]
    fn build_target_url<'a>(req: &HttpRequest, target: &'a str, passthrough: bool) -> Cow<'a, str> {
        if !passthrough {
            return Cow::Borrowed(target);
        }

        let Some(query) = req.uri().query() else {
            return Cow::Borrowed(target);
        };

        let utm_params = Self::extract_utm_params_raw(query);
        if utm_params.is_empty() {
            return Cow::Borrowed(target);
        }

        // 目标自带 fragment 时参数要插在 # 之前
        let (base, fragment) = match target.find('#') {
            Some(pos) => target.split_at(pos),
            None => (target, ""),
        };
        let separator = if base.contains('?') { "&" } else { "?" };

        Cow::Owned(format!(
            "{}{}{}{}",
            base,
            separator,
            utm_params.join("&"),
            fragment
        ))
    }

    /// 一次遍历提取所有 UTM 参数（原始片段，不重新编码）
    #[inline]
    fn extract_utm_params_raw(query: &str) -> Vec<&str> {
        const UTM_KEYS: [&str; 5] = [
            "utm_source",
            "utm_medium",
            "utm_campaign",
            "utm_term",
            "utm_content",
        ];

        query
            .split('&')
            .filter(|part| {
                part.find('=')
                    .map(|pos| UTM_KEYS.contains(&&part[..pos]))
                    .unwrap_or(false)
            })
            .collect()
    }
}

/// Redirect 路由配置，必须最后注册
pub fn redirect_routes() -> actix_web::Scope {
    web::scope("")
        .route("/{slug}*", web::get().to(RedirectService::handle_redirect))
        .route("/{slug}*", web::head().to(RedirectService::handle_redirect))
}

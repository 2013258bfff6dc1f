//! HTTP layer
//!
//! - `{api_prefix}/qrcodes`: 所有者仪表盘 API（OwnerAuth）
//! - `{health_prefix}`: 健康检查
//! - `/{slug}`: 公开扫码重定向，最后注册

pub mod middleware;
pub mod services;

use std::sync::Arc;

use actix_web::web;

use crate::analytics::ScanCounter;
use crate::config::StaticConfig;
use crate::services::{
    CodeRegistry, OwnerDirectory, QrRenderer, RegistryOptions, ResolutionEngine,
    ResolutionOptions,
};
use crate::storage::CodeStore;

use middleware::OwnerAuth;
use services::{AppStartTime, RedirectPolicy, health_routes, qrcode_routes, redirect_routes};

/// 请求体上限
const MAX_PAYLOAD_BYTES: usize = 64 * 1024;

/// 路由前缀
#[derive(Clone, Debug)]
pub struct RouteConfig {
    pub api_prefix: String,
    pub health_prefix: String,
}

/// 所有 worker 共享的组件
///
/// registry / engine / counter 共用同一个 `CodeStore`。
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CodeStore>,
    pub counter: Arc<dyn ScanCounter>,
    pub registry: Arc<CodeRegistry>,
    pub engine: Arc<ResolutionEngine>,
    pub renderer: Arc<QrRenderer>,
    pub directory: Arc<OwnerDirectory>,
    pub policy: RedirectPolicy,
    pub routes: RouteConfig,
    pub start_time: AppStartTime,
}

impl AppState {
    pub fn new(
        store: Arc<dyn CodeStore>,
        counter: Arc<dyn ScanCounter>,
        config: &StaticConfig,
    ) -> Self {
        let registry = Arc::new(CodeRegistry::new(
            store.clone(),
            RegistryOptions::from_config(config),
        ));
        let engine = Arc::new(ResolutionEngine::new(
            store.clone(),
            counter.clone(),
            ResolutionOptions::from(&config.redirect),
        ));

        Self {
            registry,
            engine,
            renderer: Arc::new(QrRenderer::from_config(&config.redirect, &config.renderer)),
            directory: Arc::new(OwnerDirectory::from_config(&config.auth)),
            policy: RedirectPolicy::from(&config.redirect),
            routes: RouteConfig {
                api_prefix: config.auth.api_prefix.clone(),
                health_prefix: config.auth.health_prefix.clone(),
            },
            start_time: AppStartTime::now(),
            store,
            counter,
        }
    }

    /// 注册 app_data 和全部路由
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::new(self.store.clone()))
            .app_data(web::Data::new(self.counter.clone()))
            .app_data(web::Data::new(self.registry.clone()))
            .app_data(web::Data::new(self.engine.clone()))
            .app_data(web::Data::new(self.renderer.clone()))
            .app_data(web::Data::new(self.policy.clone()))
            .app_data(web::Data::new(self.start_time.clone()))
            .app_data(web::PayloadConfig::new(MAX_PAYLOAD_BYTES))
            .app_data(web::JsonConfig::default().limit(MAX_PAYLOAD_BYTES))
            .service(
                web::scope(&self.routes.api_prefix)
                    .wrap(OwnerAuth::new(self.directory.clone()))
                    .service(qrcode_routes()),
            )
            .service(web::scope(&self.routes.health_prefix).service(health_routes()))
            .service(redirect_routes());
    }
}

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::analytics::{ScanCounter, ScanManager};
use crate::api::AppState;
use crate::config::{StaticConfig, validate_static_config};
use crate::storage::StorageFactory;

pub struct StartupContext {
    pub state: AppState,
    pub scan_manager: Arc<ScanManager>,
}

/// 校验配置，错误阻止启动，警告写日志
pub fn check_config(config: &StaticConfig) -> Result<()> {
    let warnings = validate_static_config(config)
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
    for warning in warnings {
        warn!("Config: {}", warning);
    }
    Ok(())
}

/// 准备服务器启动的上下文：存储、扫码计数器和各业务组件
pub async fn prepare_server_startup(config: &StaticConfig) -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    check_config(config)?;

    let store = StorageFactory::create(&config.database)
        .await
        .context("Failed to create storage backend")?;
    let backend = store.backend_config();
    info!("Using storage backend: {}", backend.storage_type);

    let scan_manager = Arc::new(ScanManager::from_config(
        store.as_scan_sink(),
        &config.scan_counter,
    ));

    // 保持强引用，后台任务随进程存活
    let mgr_for_task = scan_manager.clone();
    tokio::spawn(async move {
        mgr_for_task.start_background_task().await;
    });
    debug!(
        "ScanManager initialized: flush every {}s or after {} scans",
        config.scan_counter.flush_interval_secs, config.scan_counter.max_scans_before_flush
    );

    let counter: Arc<dyn ScanCounter> = scan_manager.clone();
    let state = AppState::new(store, counter, config);

    info!(
        "Owner API at {}/qrcodes, health at {}",
        state.routes.api_prefix, state.routes.health_prefix
    );
    debug!("Pre-startup completed in {:?}", start_time.elapsed());

    Ok(StartupContext {
        state,
        scan_manager,
    })
}

use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::analytics::ScanCounter;

/// 关闭时刷盘的超时（秒）
const FLUSH_TIMEOUT_SECS: u64 = 10;

/// 等待 Ctrl+C（Unix 下还有 SIGTERM）
async fn wait_for_signal() {
    #[cfg(unix)]
    {
        let mut term = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(term) => term,
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                if let Err(e) = signal::ctrl_c().await {
                    warn!("Failed to listen for Ctrl+C: {}", e);
                }
                return;
            }
        };

        tokio::select! {
            res = signal::ctrl_c() => {
                if let Err(e) = res {
                    warn!("Failed to listen for Ctrl+C: {}. Proceeding with shutdown anyway.", e);
                }
            }
            _ = term.recv() => {}
        }
    }

    #[cfg(not(unix))]
    if let Err(e) = signal::ctrl_c().await {
        warn!(
            "Failed to listen for Ctrl+C: {}. Proceeding with shutdown anyway.",
            e
        );
    }
}

pub async fn listen_for_shutdown(counter: Arc<dyn ScanCounter>) {
    wait_for_signal().await;
    info!("Shutdown signal received, flushing scan counts...");
    flush_on_shutdown(counter.as_ref()).await;
}

/// 把缓冲中的扫码数写回存储
pub async fn flush_on_shutdown(counter: &dyn ScanCounter) {
    let pending = counter.pending();
    if pending == 0 {
        info!("No pending scans to flush");
        return;
    }

    match timeout(Duration::from_secs(FLUSH_TIMEOUT_SECS), counter.flush()).await {
        Ok(()) => info!("Flushed {} pending scans", pending),
        Err(_) => error!(
            "Scan flush timed out after {} seconds, {} scans lost",
            FLUSH_TIMEOUT_SECS, pending
        ),
    }
}

//! 扫码计数管理器
//!
//! - 同一个 id 的高并发计数（DashMap 分片锁）
//! - 定时刷盘 + 阈值触发刷盘
//! - 刷盘失败时整批丢弃并记录日志，计数是尽力而为的

use dashmap::DashMap;
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, Ordering},
};
use tokio::sync::Mutex;
use tokio::time::{Duration, sleep, timeout};
use tracing::{debug, error, trace};

use crate::analytics::{ScanCounter, ScanSink};
use crate::config::ScanCounterConfig;

/// 扫码缓冲区
struct ScanBuffer {
    data: DashMap<Arc<str>, u64>,
    /// 缓冲区中的总扫码数（用于阈值判断）
    total_scans: AtomicU64,
    /// 防止并发刷盘
    flush_lock: Mutex<()>,
    /// 是否已有阈值触发的刷盘任务在排队
    flush_pending: AtomicBool,
}

impl ScanBuffer {
    fn new() -> Self {
        Self {
            data: DashMap::new(),
            total_scans: AtomicU64::new(0),
            flush_lock: Mutex::new(()),
            flush_pending: AtomicBool::new(false),
        }
    }

    fn increment(&self, id: &str) -> u64 {
        // 热点 id 走 get_mut，不分配 Arc
        if let Some(mut entry) = self.data.get_mut(id) {
            *entry += 1;
        } else {
            self.data
                .entry(Arc::from(id))
                .and_modify(|v| *v += 1)
                .or_insert(1);
        }

        self.total_scans.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// 逐个 remove 快照中的 key，窗口期内新增的计数留在缓冲区
    fn drain(&self) -> Vec<(String, u64)> {
        let keys: Vec<Arc<str>> = self.data.iter().map(|r| r.key().clone()).collect();

        let mut updates = Vec::with_capacity(keys.len());
        let mut total_removed = 0;
        for key in keys {
            if let Some((k, v)) = self.data.remove(&key) {
                total_removed += v;
                updates.push((k.to_string(), v));
            }
        }

        if total_removed > 0 {
            self.total_scans
                .fetch_update(Ordering::Release, Ordering::Relaxed, |current| {
                    Some(current.saturating_sub(total_removed))
                })
                .ok();
        }

        updates
    }

    fn total(&self) -> u64 {
        self.total_scans.load(Ordering::Relaxed)
    }
}

/// 扫码计数管理器
///
/// 可以 clone，所有 clone 共享同一个缓冲区。
#[derive(Clone)]
pub struct ScanManager {
    buffer: Arc<ScanBuffer>,
    sink: Arc<dyn ScanSink>,
    flush_interval: Duration,
    max_scans_before_flush: u64,
    /// 单次刷盘的总超时（包含存储层自身的重试）
    flush_timeout: Duration,
}

impl ScanManager {
    pub fn new(
        sink: Arc<dyn ScanSink>,
        flush_interval: Duration,
        max_scans_before_flush: u64,
        flush_timeout: Duration,
    ) -> Self {
        Self {
            buffer: Arc::new(ScanBuffer::new()),
            sink,
            flush_interval,
            max_scans_before_flush: max_scans_before_flush.max(1),
            flush_timeout,
        }
    }

    pub fn from_config(sink: Arc<dyn ScanSink>, config: &ScanCounterConfig) -> Self {
        Self::new(
            sink,
            Duration::from_secs(config.flush_interval_secs.max(1)),
            config.max_scans_before_flush as u64,
            Duration::from_millis(config.flush_timeout_ms),
        )
    }

    /// 后台定时刷盘，调用方负责 spawn
    pub async fn start_background_task(&self) {
        loop {
            sleep(self.flush_interval).await;

            if let Ok(_guard) = self.buffer.flush_lock.try_lock() {
                trace!("ScanManager: scheduled flush");
                Self::flush_buffer(&self.buffer, &self.sink, self.flush_timeout).await;
            } else {
                trace!("ScanManager: flush already in progress, skipping scheduled flush");
            }
        }
    }

    async fn flush_buffer(buffer: &ScanBuffer, sink: &Arc<dyn ScanSink>, limit: Duration) {
        let updates = buffer.drain();
        if updates.is_empty() {
            return;
        }

        let entries = updates.len();
        let scans: u64 = updates.iter().map(|(_, n)| n).sum();

        match timeout(limit, sink.flush_scans(updates)).await {
            Ok(Ok(())) => {
                debug!("ScanManager: flushed {} scans for {} codes", scans, entries);
            }
            Ok(Err(e)) => {
                error!(
                    "ScanManager: flush failed, dropping {} scans for {} codes: {}",
                    scans, entries, e
                );
            }
            Err(_) => {
                error!(
                    "ScanManager: flush timed out after {:?}, dropping {} scans for {} codes",
                    limit, scans, entries
                );
            }
        }
    }
}

#[async_trait::async_trait]
impl ScanCounter for ScanManager {
    fn record_scan(&self, qrcode_id: &str) {
        let current = self.buffer.increment(qrcode_id);
        trace!("ScanManager: buffered scans: {}", current);

        if current < self.max_scans_before_flush {
            return;
        }

        // 只有成功把 flush_pending 从 false 改成 true 的调用方才 spawn，避免任务风暴
        if self
            .buffer
            .flush_pending
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::Relaxed)
            .is_ok()
        {
            let buffer = Arc::clone(&self.buffer);
            let sink = Arc::clone(&self.sink);
            let limit = self.flush_timeout;
            tokio::spawn(async move {
                if let Ok(_guard) = buffer.flush_lock.try_lock() {
                    Self::flush_buffer(&buffer, &sink, limit).await;
                }
                buffer.flush_pending.store(false, Ordering::Release);
            });
        }
    }

    async fn flush(&self) {
        debug!("ScanManager: manual flush");
        let _guard = self.buffer.flush_lock.lock().await;
        Self::flush_buffer(&self.buffer, &self.sink, self.flush_timeout).await;
    }

    fn pending(&self) -> u64 {
        self.buffer.total()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct MockSink {
        flushed: std::sync::Mutex<Vec<(String, u64)>>,
        fail: bool,
    }

    impl MockSink {
        fn new() -> Self {
            Self {
                flushed: std::sync::Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new()
            }
        }

        fn total_scans(&self) -> u64 {
            self.flushed.lock().unwrap().iter().map(|(_, v)| v).sum()
        }
    }

    #[async_trait]
    impl ScanSink for MockSink {
        async fn flush_scans(&self, updates: Vec<(String, u64)>) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("storage unavailable");
            }
            self.flushed.lock().unwrap().extend(updates);
            Ok(())
        }
    }

    fn manager(sink: &Arc<MockSink>, threshold: u64) -> ScanManager {
        ScanManager::new(
            Arc::clone(sink) as Arc<dyn ScanSink>,
            Duration::from_secs(60),
            threshold,
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_record_and_flush() {
        let sink = Arc::new(MockSink::new());
        let manager = manager(&sink, 100);

        manager.record_scan("a");
        manager.record_scan("a");
        manager.record_scan("b");
        assert_eq!(manager.pending(), 3);

        manager.flush().await;

        assert_eq!(manager.pending(), 0);
        let mut flushed = sink.flushed.lock().unwrap().clone();
        flushed.sort();
        assert_eq!(flushed, vec![("a".to_string(), 2), ("b".to_string(), 1)]);
    }

    #[tokio::test]
    async fn test_failed_flush_drops_batch() {
        let sink = Arc::new(MockSink::failing());
        let manager = manager(&sink, 100);

        manager.record_scan("a");
        manager.flush().await;

        assert_eq!(manager.pending(), 0);
        assert_eq!(sink.total_scans(), 0);
    }

    #[tokio::test]
    async fn test_threshold_triggers_flush() {
        let sink = Arc::new(MockSink::new());
        let manager = manager(&sink, 5);

        for _ in 0..5 {
            manager.record_scan("hot");
        }

        for _ in 0..50 {
            if sink.total_scans() == 5 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(sink.total_scans(), 5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_scans_same_id() {
        let sink = Arc::new(MockSink::new());
        let manager = Arc::new(manager(&sink, u64::MAX));

        const TASKS: u64 = 10;
        const SCANS_PER_TASK: u64 = 1000;

        let mut handles = vec![];
        for _ in 0..TASKS {
            let mgr = Arc::clone(&manager);
            handles.push(tokio::spawn(async move {
                for _ in 0..SCANS_PER_TASK {
                    mgr.record_scan("shared");
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(manager.pending(), TASKS * SCANS_PER_TASK);
        manager.flush().await;
        assert_eq!(sink.total_scans(), TASKS * SCANS_PER_TASK);
    }

    /// 并发计数与刷盘交错时不丢数据
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_scans_and_flushes() {
        let sink = Arc::new(MockSink::new());
        let manager = Arc::new(manager(&sink, u64::MAX));

        const TASKS: u64 = 10;
        const SCANS_PER_TASK: u64 = 1000;

        let mut handles = vec![];
        for _ in 0..TASKS {
            let mgr = Arc::clone(&manager);
            handles.push(tokio::spawn(async move {
                for i in 0..SCANS_PER_TASK {
                    mgr.record_scan("shared");
                    if i % 97 == 0 {
                        tokio::task::yield_now().await;
                    }
                }
            }));
        }

        let flusher = Arc::clone(&manager);
        let flush_handle = tokio::spawn(async move {
            for _ in 0..5 {
                tokio::time::sleep(Duration::from_millis(5)).await;
                flusher.flush().await;
            }
        });

        for handle in handles {
            handle.await.unwrap();
        }
        flush_handle.await.unwrap();
        manager.flush().await;

        assert_eq!(sink.total_scans(), TASKS * SCANS_PER_TASK);
        assert_eq!(manager.pending(), 0);
    }
}

/// 扫码计数落库目标
///
/// `updates` 中每一项是 (qrcode_id, 增量)，实现必须做加法更新而不是覆盖。
#[async_trait::async_trait]
pub trait ScanSink: Send + Sync {
    async fn flush_scans(&self, updates: Vec<(String, u64)>) -> anyhow::Result<()>;
}

/// 只打日志的 sink，用于没有持久化计数需求的场景
pub struct LogSink;

#[async_trait::async_trait]
impl ScanSink for LogSink {
    async fn flush_scans(&self, updates: Vec<(String, u64)>) -> anyhow::Result<()> {
        tracing::info!("Flushing scans: {:?}", updates);
        Ok(())
    }
}

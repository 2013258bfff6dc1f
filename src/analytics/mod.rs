//! 扫码计数
//!
//! 重定向路径只往内存缓冲里加一，真正的数据库写入由后台批量完成。

pub mod manager;
pub mod sink;

pub use manager::ScanManager;
pub use sink::{LogSink, ScanSink};

/// 扫码计数器
#[async_trait::async_trait]
pub trait ScanCounter: Send + Sync {
    /// 记录一次扫码，不等待落库
    fn record_scan(&self, qrcode_id: &str);

    /// 立即刷盘并等待完成
    async fn flush(&self);

    /// 尚未落库的扫码数
    fn pending(&self) -> u64;
}

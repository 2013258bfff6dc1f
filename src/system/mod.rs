//! System-level modules
//!
//! 进程级基础设施：目前只有日志初始化。

pub mod logging;

pub use logging::init_logging;

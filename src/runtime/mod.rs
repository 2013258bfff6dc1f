//! Runtime module
//!
//! 进程生命周期（启动准备、优雅关闭）和运行模式（server / cli）。

pub mod lifetime;
pub mod modes;

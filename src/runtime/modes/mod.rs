//! Mode routing
//!
//! 没有子命令或子命令为 `serve` 时进入 server 模式，其余交给 CLI。

pub mod cli;
pub mod server;

pub use cli::run_cli;
pub use server::run_server;

use crate::cli::Commands;

#[derive(Debug, PartialEq, Eq)]
pub enum Mode {
    Server,
    Cli,
}

pub fn detect_mode(command: Option<&Commands>) -> Mode {
    match command {
        None | Some(Commands::Serve) => Mode::Server,
        Some(_) => Mode::Cli,
    }
}

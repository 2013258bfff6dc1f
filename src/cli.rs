//! Command-line interface definitions using clap

use clap::{Parser, Subcommand};

/// qrlinker - dynamic QR code service
#[derive(Parser)]
#[command(name = "qrlinker")]
#[command(version)]
#[command(about = "Dynamic QR code service: redirects, scan counting and an owner API", long_about = None)]
pub struct Cli {
    /// Path to the TOML config file
    #[arg(long, short = 'c', global = true, default_value = "config.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Write a sample configuration file
    GenerateConfig {
        /// Output path (default: config.example.toml)
        output_path: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Apply pending database migrations and exit
    Migrate,
}

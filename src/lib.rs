//! qrlinker - dynamic QR code service
//!
//! QR codes whose destination can change after printing. The crate holds the
//! server-side core: an owner-scoped code registry, the public redirect
//! endpoint that resolves slugs, a buffered scan counter and bearer-token
//! owner verification.
//!
//! # Architecture
//! - `storage`: `CodeStore` trait, SeaORM and in-memory backends
//! - `analytics`: buffered scan counting
//! - `services`: registry, resolution engine, owner directory, renderer URLs
//! - `api`: HTTP services and middleware
//! - `interfaces`: CLI commands
//! - `config`: configuration management
//! - `runtime`: application lifecycle and execution modes
//! - `system`: logging

pub mod analytics;
pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod interfaces;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;

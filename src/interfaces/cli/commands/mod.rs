mod config_gen;
mod migrate;

pub use config_gen::config_generate;
pub use migrate::run_migrate;

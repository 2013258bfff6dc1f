//! Migrate command

use colored::Colorize;

use crate::config::get_config;
use crate::interfaces::cli::CliError;
use crate::storage::{MEMORY_DATABASE_URL, StorageFactory};

/// 连接数据库并执行全部迁移（建立连接时自动执行）
pub async fn run_migrate() -> Result<(), CliError> {
    let config = get_config();

    if config.database.database_url == MEMORY_DATABASE_URL {
        return Err(CliError::ConfigError(
            "database.database_url is 'memory'; there is nothing to migrate".to_string(),
        ));
    }

    let store = StorageFactory::create(&config.database).await?;
    let count = store.count().await?;

    println!(
        "{} {} ({} QR codes)",
        "Migrations applied on".green(),
        store.backend_config().storage_type.blue(),
        count
    );
    Ok(())
}

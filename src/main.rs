use clap::Parser;

use qrlinker::cli::Cli;
use qrlinker::config::{get_config, init_config_from};
use qrlinker::runtime::modes::{self, Mode};
use qrlinker::system::init_logging;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    init_config_from(&cli.config);

    match modes::detect_mode(cli.command.as_ref()) {
        Mode::Server => {
            // guard 必须存活到进程结束
            let _guard = init_logging(&get_config().logging)?;
            modes::run_server().await
        }
        Mode::Cli => {
            let Some(command) = cli.command else {
                return Ok(());
            };
            if let Err(e) = modes::run_cli(command).await {
                eprintln!("{}", e.format_colored());
                std::process::exit(1);
            }
            Ok(())
        }
    }
}

use clap::Parser;
use odc_lib::{app, cli::Cli, cli::Command, logging};
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // A missing .env is fine.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    if let Err(e) = logging::init(&cli.log_level, cli.json_logs) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    let config = match cli.config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let command = cli.command.clone().unwrap_or(Command::Interactive);
    match app::run(config, command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

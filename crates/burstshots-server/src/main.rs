//! burstshots entry point.

use std::process::ExitCode;

use clap::Parser;

use burstshots_core::init_tracing;
use burstshots_server::cli::{Cli, Command};
use burstshots_server::commands;
use burstshots_server::config::ServerConfig;
use burstshots_server::error::ServerResult;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ServerResult<()> {
    let mut config = match cli.config {
        Some(ref path) => ServerConfig::load_from(path)?,
        None => ServerConfig::load()?,
    };
    cli.apply(&mut config);

    init_tracing(config.tracing_config(cli.debug)?)?;

    match cli.command() {
        Command::Serve => commands::serve::run(&config).await,
        Command::Auth { force } => commands::auth::run(&config, force).await,
    }
}

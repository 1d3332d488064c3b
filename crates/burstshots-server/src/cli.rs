//! Command-line interface definition.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use burstshots_core::TracingOutputFormat;

use crate::config::ServerConfig;

/// burstshots - Find burst shots in your Google Photos library
#[derive(Debug, Parser)]
#[command(name = "burstshots")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "BURSTSHOTS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to listen on
    #[arg(long, env = "BURSTSHOTS_BIND")]
    pub bind: Option<SocketAddr>,

    /// Path to the OAuth client secret JSON
    #[arg(long, env = "BURSTSHOTS_CLIENT_SECRET")]
    pub client_secret: Option<PathBuf>,

    /// Directory for stored OAuth tokens
    #[arg(long, env = "BURSTSHOTS_TOKEN_DIR")]
    pub token_dir: Option<PathBuf>,

    /// Log format: pretty, compact or json
    #[arg(long)]
    pub log_format: Option<TracingOutputFormat>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Subcommands. Without one, the server runs.
#[derive(Debug, Clone, Subcommand, PartialEq, Eq)]
pub enum Command {
    /// Run the web server
    Serve,

    /// Authorize Google Photos access and store the token
    Auth {
        /// Discard any stored token and authorize again
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    /// Applies command-line overrides on top of the file configuration.
    pub fn apply(&self, config: &mut ServerConfig) {
        if let Some(bind) = self.bind {
            config.server.bind = bind;
        }
        if let Some(ref path) = self.client_secret {
            config.google.client_secret_path = path.clone();
        }
        if let Some(ref dir) = self.token_dir {
            config.google.token_dir = dir.clone();
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
    }

    /// The subcommand to run, `serve` when none was given.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve)
    }
}

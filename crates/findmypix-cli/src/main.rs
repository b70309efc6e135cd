//! findmypix - command-line client for the findmypix event photo service.
//!
//! Signs in through the web app's identity provider and talks to the
//! backend through the authenticated pipeline in `findmypix-http`.

mod cli;
mod commands;
mod output;
mod session;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cli::{Cli, Commands};
use commands::{events, health, images, login, logout, matching, stats, whoami};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.json_logs);

    match cli.command {
        Commands::Login(args) => login::run(args).await,
        Commands::Logout(args) => logout::run(args).await,
        Commands::Whoami(args) => whoami::run(args).await,
        Commands::Events(cmd) => events::handle(cmd).await,
        Commands::Images(cmd) => images::handle(cmd).await,
        Commands::Match(cmd) => matching::handle(cmd).await,
        Commands::Stats(args) => stats::run(args).await,
        Commands::Health(args) => health::run(args).await,
    }
}

fn init_logging(verbosity: u8, json: bool) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // Logs go to stderr so command output stays pipeable.
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

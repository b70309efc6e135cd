//! CLI argument definitions.

use clap::{Parser, Subcommand};

use crate::commands::{events, health, images, login, logout, matching, stats, whoami};

/// Browse events, upload photos and find faces on findmypix.
#[derive(Parser, Debug)]
#[command(name = "findmypix")]
#[command(author, version = env!("FINDMYPIX_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in with a session cookie from the web app
    Login(login::LoginArgs),

    /// Forget the stored session
    Logout(logout::LogoutArgs),

    /// Display the signed-in user
    Whoami(whoami::WhoamiArgs),

    /// Event operations
    Events(events::EventsCommand),

    /// Image operations
    Images(images::ImagesCommand),

    /// Face search within an event
    Match(matching::MatchCommand),

    /// Show service counters
    Stats(stats::StatsArgs),

    /// Check that the backend is up
    Health(health::HealthArgs),
}

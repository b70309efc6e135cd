//! Health command implementation.

use anyhow::{Context, Result};
use clap::Args;

use crate::commands::DEFAULT_API;
use crate::output;
use crate::session;

#[derive(Args, Debug)]
pub struct HealthArgs {
    /// Backend API base URL, used when not logged in
    #[arg(long, env = "FINDMYPIX_API", default_value = DEFAULT_API)]
    pub api: String,
}

pub async fn run(args: HealthArgs) -> Result<()> {
    let client = session::connect_or_anonymous(&args.api)?;
    let health = client.health().await.context("Backend health check failed")?;

    output::success(&format!("{} is {}", client.api_url(), health.status));
    Ok(())
}

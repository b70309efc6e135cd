//! Stats command implementation.

use anyhow::Result;
use clap::Args;
use futures_util::future::join_all;
use tracing::debug;

use findmypix_core::models::StatKind;

use crate::commands::DEFAULT_API;
use crate::output;
use crate::session;

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Backend API base URL, used when not logged in
    #[arg(long, env = "FINDMYPIX_API", default_value = DEFAULT_API)]
    pub api: String,
}

pub async fn run(args: StatsArgs) -> Result<()> {
    let client = session::connect_or_anonymous(&args.api)?;

    let counts = join_all(StatKind::ALL.iter().map(|kind| client.count(*kind))).await;

    for (kind, count) in StatKind::ALL.iter().zip(counts) {
        let count = count.unwrap_or_else(|e| {
            debug!(%kind, error = %e, "Counter unavailable");
            0
        });
        output::field(kind.as_str(), &count.to_string());
    }
    Ok(())
}

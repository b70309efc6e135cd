//! Login command implementation.

use anyhow::{Context, Result, bail};
use clap::Args;
use colored::Colorize;

use findmypix_core::{ApiUrl, SessionSource};
use findmypix_http::IdentityProvider;
use findmypix_http::config::DEFAULT_SESSION_COOKIE;

use crate::commands::DEFAULT_API;
use crate::output;
use crate::session::{StoredSession, storage};

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Value of the web app's session cookie
    #[arg(long)]
    pub session_token: String,

    /// Backend API base URL
    #[arg(long, env = "FINDMYPIX_API", default_value = DEFAULT_API)]
    pub api: String,

    /// Web app (identity provider) base URL
    #[arg(long, env = "FINDMYPIX_IDENTITY", default_value = "http://localhost:3000")]
    pub identity: String,

    /// Name of the session cookie
    #[arg(long, default_value = DEFAULT_SESSION_COOKIE)]
    pub cookie_name: String,
}

pub async fn run(args: LoginArgs) -> Result<()> {
    let api = ApiUrl::new(&args.api).context("Invalid API URL")?;
    let identity = ApiUrl::new(&args.identity).context("Invalid identity URL")?;

    let mut stored = StoredSession {
        api_url: api.to_string(),
        identity_url: identity.to_string(),
        cookie_name: args.cookie_name,
        cookie_value: args.session_token,
        user: None,
    };

    eprintln!("{}", "Checking session...".dimmed());

    let provider = IdentityProvider::new(&stored.identity_config()?)
        .context("Failed to configure identity provider")?;
    let Some(session) = provider
        .current_session()
        .await
        .context("Failed to reach identity provider")?
    else {
        bail!("The identity provider did not accept this session token");
    };

    stored.user = session.user.clone();
    storage::save_session(&stored).context("Failed to save session")?;

    output::success("Logged in successfully");
    println!();
    if let Some(name) = session.display_name() {
        output::field("User", name);
    }
    output::field("API", api.as_str());
    output::field("Identity", identity.as_str());

    Ok(())
}

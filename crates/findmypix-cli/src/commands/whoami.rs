//! Whoami command implementation.

use anyhow::{Context, Result, bail};
use clap::Args;

use findmypix_core::{SessionSource, SignOutSink};
use findmypix_http::IdentityProvider;

use crate::output;
use crate::session::{ExpireStoredSession, NO_SESSION, storage};

#[derive(Args, Debug)]
pub struct WhoamiArgs {}

pub async fn run(_args: WhoamiArgs) -> Result<()> {
    let stored = storage::load_session()
        .context("Failed to load session")?
        .context(NO_SESSION)?;

    let provider = IdentityProvider::new(&stored.identity_config()?)
        .context("Failed to configure identity provider")?;
    let Some(session) = provider
        .current_session()
        .await
        .context("Failed to reach identity provider")?
    else {
        ExpireStoredSession.terminate().await?;
        bail!("Not signed in");
    };

    let user = session.user.as_ref().or(stored.user.as_ref());
    if let Some(name) = user.and_then(|u| u.name.as_deref()) {
        output::field("Name", name);
    }
    if let Some(email) = user.and_then(|u| u.email.as_deref()) {
        output::field("Email", email);
    }
    if let Some(expires) = session.expires {
        output::field("Expires", &expires.to_rfc3339());
    }
    output::field("API", &stored.api_url);

    Ok(())
}

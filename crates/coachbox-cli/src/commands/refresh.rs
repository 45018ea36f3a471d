//! Refresh command implementation.

use anyhow::Result;
use clap::Args;

use crate::cli::GlobalArgs;
use crate::output;
use crate::session;

#[derive(Args, Debug)]
pub struct RefreshArgs {}

pub async fn run(_args: RefreshArgs, global: &GlobalArgs) -> Result<()> {
    let session = session::open_logged_in(global)?;

    output::progress("Refreshing session...");

    // Failure here is always a session expiry, reported by main.
    let credential = session.refresh().await?;

    output::success("Session refreshed successfully");
    if let Ok(claims) = coachbox_core::decode_claims(credential.access_token().as_str())
        && let Some(expires) = claims.expires_at()
    {
        output::field("Expires", &expires.to_rfc3339());
    }

    Ok(())
}

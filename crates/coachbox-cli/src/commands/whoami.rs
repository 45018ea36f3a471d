//! Whoami command implementation.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;

use coachbox_core::{decode_claims, is_usable_at};

use crate::cli::GlobalArgs;
use crate::output;
use crate::session;

#[derive(Args, Debug)]
pub struct WhoamiArgs {
    /// Also fetch the user profile from the backend
    #[arg(long)]
    pub remote: bool,
}

pub async fn run(args: WhoamiArgs, global: &GlobalArgs) -> Result<()> {
    let session = session::open_logged_in(global)?;
    let credential = session
        .credential()
        .context("Failed to read session")?
        .context("No active session. Run 'coachbox login' first.")?;

    output::field("API", session.api().as_str());
    output::field("Token type", credential.token_type());

    match decode_claims(credential.access_token().as_str()) {
        Ok(claims) => {
            if let Some(sub) = &claims.sub {
                output::field("Subject", sub);
            }
            if let Some(expires) = claims.expires_at() {
                output::field("Expires", &expires.to_rfc3339());
            }
            let usable = is_usable_at(
                credential.access_token(),
                Utc::now(),
                session.config().expiry_margin(),
            );
            output::field("Status", if usable { "valid" } else { "expired" });
        }
        Err(err) => output::field("Status", &format!("malformed ({err})")),
    }

    if args.remote {
        let me = session
            .users()
            .me()
            .await
            .context("Failed to fetch user profile")?;
        println!();
        output::json_pretty(&me)?;
    }

    Ok(())
}

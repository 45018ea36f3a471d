//! Login command implementation.

use anyhow::{Context, Result};
use clap::Args;

use coachbox_core::LoginCredentials;

use crate::cli::GlobalArgs;
use crate::output;
use crate::session;

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account username (usually the email address)
    #[arg(long)]
    pub username: String,

    /// Account password
    #[arg(long, env = "COACHBOX_PASSWORD", hide_env_values = true)]
    pub password: String,
}

pub async fn run(args: LoginArgs, global: &GlobalArgs) -> Result<()> {
    let session = session::open(global)?;
    let credentials = LoginCredentials::new(&args.username, &args.password);

    output::progress("Logging in...");

    let credential = session
        .login(&credentials)
        .await
        .context("Failed to login")?;

    output::success("Logged in successfully");
    println!();
    output::field("API", session.api().as_str());
    output::field("Token type", credential.token_type());

    Ok(())
}

//! Subcommand implementations.

mod login;
mod logout;
mod refresh;
mod request;
mod upload;
mod whoami;

use anyhow::Result;
use clap::Subcommand;

use crate::cli::GlobalArgs;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in and store the session
    Login(login::LoginArgs),

    /// Display the stored session
    Whoami(whoami::WhoamiArgs),

    /// Force a token refresh
    Refresh(refresh::RefreshArgs),

    /// End the session
    Logout(logout::LogoutArgs),

    /// Call a backend endpoint with the session attached
    Request(request::RequestArgs),

    /// Upload a file as a multipart form
    Upload(upload::UploadArgs),
}

pub async fn handle(cmd: Command, global: &GlobalArgs) -> Result<()> {
    match cmd {
        Command::Login(args) => login::run(args, global).await,
        Command::Whoami(args) => whoami::run(args, global).await,
        Command::Refresh(args) => refresh::run(args, global).await,
        Command::Logout(args) => logout::run(args, global).await,
        Command::Request(args) => request::run(args, global).await,
        Command::Upload(args) => upload::run(args, global).await,
    }
}

/// Parse a `key=value` argument.
fn key_value(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{s}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_value_splits_on_first_equals() {
        assert_eq!(
            key_value("q=a=b").unwrap(),
            ("q".to_string(), "a=b".to_string())
        );
        assert!(key_value("novalue").is_err());
    }
}

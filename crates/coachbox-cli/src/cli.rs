//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser};

use crate::commands::Command;

/// Log in to the coachbox backend and call it with a managed session.
#[derive(Parser, Debug)]
#[command(name = "coachbox")]
#[command(author, version = env!("COACHBOX_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command.
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Backend base URL
    #[arg(
        long,
        env = "COACHBOX_API",
        default_value = "http://localhost:8000",
        global = true
    )]
    pub api: String,

    /// Session file (defaults to the platform data directory)
    #[arg(long, env = "COACHBOX_SESSION_FILE", global = true)]
    pub session_file: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30, global = true)]
    pub timeout: u64,
}

//! Upload command implementation.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;

use coachbox_http::{Request, VIDEO_UPLOAD};

use crate::cli::GlobalArgs;
use crate::output;
use crate::session;

#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Endpoint path
    #[arg(default_value = VIDEO_UPLOAD)]
    pub path: String,

    /// File to upload
    #[arg(long)]
    pub file: PathBuf,

    /// Extra form field (repeatable)
    #[arg(long = "field", value_name = "KEY=VALUE", value_parser = super::key_value)]
    pub fields: Vec<(String, String)>,
}

pub async fn run(args: UploadArgs, global: &GlobalArgs) -> Result<()> {
    let bytes = fs::read(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let file_name = args
        .file
        .file_name()
        .and_then(|n| n.to_str())
        .context("File name is not valid UTF-8")?
        .to_string();

    let fields: Vec<(&str, &str)> = args
        .fields
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();

    let session = session::open_logged_in(global)?;
    output::progress(&format!("Uploading {} ({} bytes)...", file_name, bytes.len()));

    let response = session
        .dispatch(Request::upload(&args.path, file_name, bytes, &fields))
        .await?;
    let status = response.status();
    let text = response.text().await.context("Failed to read response")?;

    if !status.is_success() {
        bail!("HTTP {status}: {text}");
    }

    output::success("Uploaded");
    super::request::print_body(&text)
}

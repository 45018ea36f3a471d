//! Request command implementation.

use anyhow::{Context, Result, bail};
use clap::Args;

use coachbox_http::Request;

use crate::cli::GlobalArgs;
use crate::output;
use crate::session;

#[derive(Args, Debug)]
pub struct RequestArgs {
    /// HTTP method (GET, POST, PUT, PATCH, DELETE)
    pub method: String,

    /// Endpoint path (e.g., /athletes)
    pub path: String,

    /// JSON request body
    #[arg(long)]
    pub json: Option<String>,

    /// Query parameter (repeatable)
    #[arg(long = "query", value_name = "KEY=VALUE", value_parser = super::key_value)]
    pub query: Vec<(String, String)>,
}

pub async fn run(args: RequestArgs, global: &GlobalArgs) -> Result<()> {
    let mut request = match args.method.to_ascii_uppercase().as_str() {
        "GET" => Request::get(&args.path),
        "POST" => Request::post(&args.path),
        "PUT" => Request::put(&args.path),
        "PATCH" => Request::patch(&args.path),
        "DELETE" => Request::delete(&args.path),
        other => bail!("Unsupported method: {other}"),
    };

    if let Some(body) = &args.json {
        let value: serde_json::Value =
            serde_json::from_str(body).context("Invalid JSON body")?;
        request = request.with_json(value);
    }
    for (key, value) in args.query {
        request = request.with_query(key, value);
    }

    let session = session::open_logged_in(global)?;
    let response = session.dispatch(request).await?;
    let status = response.status();
    let text = response.text().await.context("Failed to read response")?;

    if !status.is_success() {
        bail!("HTTP {status}: {text}");
    }
    print_body(&text)
}

/// Pretty-print a JSON body; fall back to the raw text.
pub(super) fn print_body(text: &str) -> Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(value) => output::json_pretty(&value),
        Err(_) => {
            println!("{text}");
            Ok(())
        }
    }
}

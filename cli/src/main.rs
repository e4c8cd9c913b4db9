//! Faultline CLI
//!
//! Command-line client that sends error reports to a Faultline server.
//!
//! # Usage
//!
//! ```bash
//! faultline --help
//! faultline report --service api --endpoint /v1/users --error "timeout"
//! faultline --url http://errors.internal report -s worker -e resize -m "OOM" -t "$(cat trace.txt)"
//! ```

#![deny(unsafe_code)]

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use shared::models::ErrorReport;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Faultline CLI - error report client
#[derive(Parser)]
#[command(name = "faultline")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Ingestion server URL
    #[arg(
        short,
        long,
        env = "FAULTLINE_URL",
        default_value = "http://localhost:8080"
    )]
    url: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send an error report
    Report(ReportArgs),
}

#[derive(Args)]
struct ReportArgs {
    /// Name of the reporting service
    #[arg(short, long)]
    service: String,

    /// Failing operation
    #[arg(short, long)]
    endpoint: String,

    /// Error message
    #[arg(short = 'm', long)]
    error: String,

    /// Stack trace or other diagnostic detail
    #[arg(short, long)]
    traceback: Option<String>,
}

impl From<ReportArgs> for ErrorReport {
    fn from(args: ReportArgs) -> Self {
        let report = Self::new(args.service, args.endpoint, args.error);
        match args.traceback {
            Some(traceback) => report.with_traceback(traceback),
            None => report,
        }
    }
}

/// Server answer to a report.
#[derive(Debug, PartialEq, Eq)]
struct Outcome {
    status: u16,
    message: String,
}

/// Posts `report` to the server at `base_url`.
///
/// The server answers with a JSON string; anything else is returned as raw text.
async fn send_report(
    client: &reqwest::Client,
    base_url: &str,
    report: &ErrorReport,
) -> anyhow::Result<Outcome> {
    let url = format!("{}/", base_url.trim_end_matches('/'));
    tracing::debug!(%url, service = %report.service, "Sending error report");

    let body = serde_json::to_vec(report)?;
    let response = client
        .post(&url)
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body(body)
        .send()
        .await
        .with_context(|| format!("Failed to reach {url}"))?;

    let status = response.status().as_u16();
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<String>(&text).unwrap_or(text);

    Ok(Outcome { status, message })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Report(args)) => {
            let report = ErrorReport::from(args);
            report
                .validate_report()
                .context("Refusing to send incomplete report")?;

            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(cli.timeout))
                .build()?;
            let outcome = send_report(&client, &cli.url, &report).await?;

            println!("{} {}", outcome.status, outcome.message);
            if !(200..300).contains(&outcome.status) {
                bail!("Server rejected report with status {}", outcome.status);
            }
        }
        None => {
            println!("Faultline CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for usage information");
        }
    }

    Ok(())
}

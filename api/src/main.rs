//! Faultline API Server Binary
//!
//! Entry point for the Faultline error report ingestion server.

#![deny(unsafe_code)]

use anyhow::Result;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine; the process environment still applies.
    let dotenv = dotenvy::dotenv();

    init_tracing();

    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "Loaded environment file");
    }

    if let Err(e) = api::run_server().await {
        tracing::error!(error = %format!("{e:#}"), "Faultline API server failed");
        return Err(e);
    }
    Ok(())
}

/// Installs the global subscriber. `FAULTLINE_LOG_FORMAT=json` selects JSON
/// output; the filter comes from `RUST_LOG` and defaults to `info`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("FAULTLINE_LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

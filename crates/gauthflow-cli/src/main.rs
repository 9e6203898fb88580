//! gauthflow CLI entry point.

use std::process::ExitCode;
use std::time::Duration;

use chrono::SecondsFormat;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use gauthflow_oauth::{AuthResult, CalendarClient, ClientCredentials, FlowOptions, OAuthFlow};

use crate::cli::Cli;

mod cli;

/// OAuth client credentials registered in the Google Cloud Console,
/// embedded at build time.
static CLIENT_DOCUMENT: &str = include_str!("../client.json");

/// Request timeout for the sample listing call.
const LISTING_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.debug {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(Level::WARN.to_string()))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> AuthResult<()> {
    let credentials = ClientCredentials::from_json(CLIENT_DOCUMENT)?;

    let options = FlowOptions::new(cli.variant.scope())
        .with_timeout((cli.timeout_secs > 0).then(|| Duration::from_secs(cli.timeout_secs)))
        .with_open_browser(!cli.no_browser);

    let flow = OAuthFlow::new(credentials, options);
    let tokens = flow.run().await?;

    println!();
    println!("AccessToken={}", tokens.access_token);
    println!("TokenType={}", tokens.token_type);
    println!("RefreshToken={}", tokens.refresh_token);
    println!(
        "Expiry={}",
        tokens.expires_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    );

    if cli.variant.has_sample_listing() && !cli.skip_listing {
        let client = CalendarClient::new(&tokens.access_token, LISTING_TIMEOUT);
        let events = client.list_events("primary", cli.max_items).await?;

        for event in &events {
            println!(
                "DateTime={}, Summary={}, Description={}",
                event.start_display(),
                event.summary.as_deref().unwrap_or(""),
                event.description.as_deref().unwrap_or(""),
            );
        }
    }

    Ok(())
}

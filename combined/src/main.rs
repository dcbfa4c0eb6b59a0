//! Ferrule - CLI entry point
//!
//! Registers the services the chosen command needs, then dispatches it.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ferrule::{cli::Cli, commands, common::Settings};

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize tracing (verbose mode sets debug level)
    init_tracing(cli.verbose);

    // Load configuration
    let settings = Settings::from_env();
    tracing::debug!(?settings, "Configuration loaded");

    let result = match commands::services_for(&cli.command, &settings).await {
        Ok(services) => commands::execute(cli.command, &services).await,
        Err(e) => Err(e),
    };

    // Handle errors
    match result {
        Ok(output) => println!("{}", output),
        Err(e) => {
            tracing::error!(code = e.code(), "Command failed: {}", e);
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        "debug".to_string()
    } else {
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string())
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::new(filter))
        .init();
}

//! # Pactwatch
//!
//! The main binary for the Pactwatch contract portfolio server.
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! pactwatch serve --host 0.0.0.0 --port 8080
//!
//! # CLI operations
//! pactwatch dashboard
//! pactwatch list --risk high
//! pactwatch upload -f lease.pdf
//! pactwatch classify --expires 2026-03-01 --today 2026-02-01
//! ```

use clap::Parser;
use pactwatch::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // PACTWATCH_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("PACTWATCH_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pactwatch=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

fn print_banner() {
    println!(
        r#"
  ┌─┐┌─┐┌─┐┌┬┐┬ ┬┌─┐┌┬┐┌─┐┬ ┬
  ├─┘├─┤│   │ │││├─┤ │ │  ├─┤
  ┴  ┴ ┴└─┘ ┴ └┴┘┴ ┴ ┴ └─┘┴ ┴

  Contract portfolio server v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}

//! # Pactwatch CLI Module
//!
//! ## Available Commands
//!
//! - `serve` - Start the HTTP server
//! - `list` - List contracts with their risk tier
//! - `dashboard` - Portfolio summary (default)
//! - `upload` - Upload a contract document
//! - `classify` - Classify one expiration date

mod commands;

use crate::error::AppError;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use pactwatch_core::{ContractStatus, RiskLevel, parse_expiration};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Pactwatch - contract portfolio and expiration risk
#[derive(Parser, Debug)]
#[command(name = "pactwatch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the TOML configuration file
    #[arg(short, long, global = true, default_value = "pactwatch.toml")]
    pub config: PathBuf,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Classify as of this date (YYYY-MM-DD) instead of now
    #[arg(long, global = true, value_parser = parse_date_arg)]
    pub today: Option<NaiveDate>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Serve {
        /// Host to bind to (overrides the config file)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides the config file)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List contracts with their risk tier
    List {
        /// Only this risk tier (low, medium, high)
        #[arg(short, long)]
        risk: Option<RiskLevel>,

        /// Only this status (active, draft, expired)
        #[arg(short, long)]
        status: Option<ContractStatus>,

        /// Case-insensitive match on name, type or counterparty
        #[arg(long)]
        search: Option<String>,
    },

    /// Show the portfolio summary
    Dashboard,

    /// Upload a contract document
    Upload {
        /// Path to the document
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Classify one expiration date
    Classify {
        /// Expiration date (YYYY-MM-DD or RFC 3339)
        #[arg(short, long)]
        expires: String,
    },
}

fn parse_date_arg(value: &str) -> Result<NaiveDate, String> {
    parse_expiration(value).map_err(|e| e.to_string())
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), AppError> {
    let settings = Settings::load(&cli.config, cli.today, cli.json_mode)?;

    match cli.command {
        Some(Commands::Serve { host, port }) => cmd_serve(&settings, host, port).await,
        Some(Commands::List {
            risk,
            status,
            search,
        }) => cmd_list(&settings, risk, status, search).await,
        Some(Commands::Upload { file }) => cmd_upload(&settings, &file).await,
        Some(Commands::Classify { expires }) => cmd_classify(&settings, &expires),
        Some(Commands::Dashboard) | None => cmd_dashboard(&settings).await,
    }
}

//! # CLI Command Implementations

use crate::api::{self, AppState, ContractListResponse};
use crate::config::PactwatchConfig;
use crate::error::AppError;
use crate::session::AuthSession;
use crate::store::{StoreBackend, UploadFile};
use crate::workspace::{Workspace, follow_session};
use chrono::NaiveDate;
use pactwatch_core::{
    CatalogFilter, Clock, ContractStatus, DashboardSummary, FixedClock, RiskLevel, SystemClock,
    days_until_date, parse_expiration, tier_for_days,
};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

// =============================================================================
// SETTINGS
// =============================================================================

/// Everything a command needs before it touches the store.
pub struct Settings {
    pub config: PactwatchConfig,
    pub clock: Arc<dyn Clock>,
    pub json_mode: bool,
}

impl Settings {
    /// Load the config file and pick the clock.
    pub fn load(
        config_path: &Path,
        today: Option<NaiveDate>,
        json_mode: bool,
    ) -> Result<Self, AppError> {
        let config = PactwatchConfig::load(config_path)?;
        let clock: Arc<dyn Clock> = match today {
            Some(date) => {
                tracing::debug!(%date, "Reference date pinned");
                Arc::new(FixedClock::at_date(date))
            }
            None => Arc::new(SystemClock),
        };
        Ok(Self {
            config,
            clock,
            json_mode,
        })
    }

    /// Build the workspace for the configured store and user. Nothing is
    /// fetched yet.
    pub fn workspace(&self) -> Result<Workspace<StoreBackend>, AppError> {
        let store = StoreBackend::from_config(&self.config.store, Arc::clone(&self.clock))?;
        let auth = match self.config.session.user_session() {
            Some(session) => AuthSession::signed_in(session),
            None => AuthSession::new(),
        };
        tracing::debug!(backend = store.kind(), signed_in = auth.is_signed_in(), "Workspace ready");
        Ok(Workspace::new(store, auth, Arc::clone(&self.clock)))
    }

    /// Build the workspace and load the signed-in user's catalog.
    async fn loaded_workspace(&self) -> Result<Workspace<StoreBackend>, AppError> {
        let mut workspace = self.workspace()?;
        workspace.refresh().await?;
        Ok(workspace)
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::Io(format!("Cannot encode output: {}", e)))?;
    println!("{}", text);
    Ok(())
}

// =============================================================================
// SERVE COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_serve(
    settings: &Settings,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), AppError> {
    let host = host.unwrap_or_else(|| settings.config.server.host.clone());
    let port = port.unwrap_or(settings.config.server.port);

    let mut workspace = settings.workspace()?;
    let backend = workspace.store().kind();
    if workspace.auth().is_signed_in() {
        if let Err(e) = workspace.refresh().await {
            tracing::warn!(error = %e, "Initial catalog load failed; retry with POST /contracts/refresh");
        }
    } else {
        tracing::warn!("No user configured; contract endpoints answer 401 until one signs in");
    }

    let changes = workspace.auth().subscribe();
    let state = AppState::new(workspace);
    tokio::spawn(follow_session(Arc::clone(&state.workspace), changes));

    println!("Pactwatch Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:     {}", host);
    println!("  Port:     {}", port);
    println!("  Backend:  {}", backend);
    println!();
    println!("Endpoints:");
    println!("  GET  /contracts          - List contracts");
    println!("  POST /contracts          - Upload a document");
    println!("  POST /contracts/refresh  - Re-fetch the catalog");
    println!("  GET  /dashboard          - Portfolio summary");
    println!("  GET  /classify           - Classify one date");
    println!("  GET  /session            - Current session");
    println!("  POST /session/sign-out   - End the session");
    println!("  GET  /health             - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, state).await
}

// =============================================================================
// LIST COMMAND
// =============================================================================

/// List the catalog with risk tiers.
pub async fn cmd_list(
    settings: &Settings,
    risk: Option<RiskLevel>,
    status: Option<ContractStatus>,
    search: Option<String>,
) -> Result<(), AppError> {
    let workspace = settings.loaded_workspace().await?;
    let filter = CatalogFilter {
        risk,
        status,
        search,
    };
    let contracts = workspace.contracts(&filter)?;

    if settings.json_mode {
        return print_json(&ContractListResponse {
            reference: workspace.now(),
            count: contracts.len(),
            contracts,
        });
    }

    if contracts.is_empty() {
        println!("No contracts.");
        return Ok(());
    }

    println!(
        "{:<20} {:<28} {:<10} {:<22} {:<10} {:<7} {}",
        "ID", "NAME", "TYPE", "COUNTERPARTY", "EXPIRES", "STATUS", "RISK"
    );
    for contract in &contracts {
        println!(
            "{:<20} {:<28} {:<10} {:<22} {:<10} {:<7} {}",
            contract.id(),
            contract.name(),
            contract.contract_type(),
            contract.counterparty(),
            contract.expiration_date().to_string(),
            contract.status(),
            contract.risk_level()
        );
    }
    println!();
    println!("{} contract(s) as of {}", contracts.len(), workspace.now().date_naive());
    Ok(())
}

// =============================================================================
// DASHBOARD COMMAND
// =============================================================================

/// Show the portfolio summary.
pub async fn cmd_dashboard(settings: &Settings) -> Result<(), AppError> {
    let workspace = settings.loaded_workspace().await?;
    let summary = workspace.dashboard()?;

    if settings.json_mode {
        return print_json(&summary);
    }
    print_dashboard(&summary);
    Ok(())
}

fn print_dashboard(summary: &DashboardSummary) {
    println!("Portfolio as of {}", summary.reference.date_naive());
    println!();
    println!("  Contracts: {}", summary.total);
    println!(
        "  Active: {}  Draft: {}  Expired: {}",
        summary.by_status.active, summary.by_status.draft, summary.by_status.expired
    );
    println!();
    println!("Risk:");
    for level in RiskLevel::ALL.iter().rev() {
        println!("  {:<7} {}", level.name(), summary.by_risk.count(*level));
    }

    if !summary.expiring_soon.is_empty() {
        println!();
        println!("Expiring soon:");
        for item in &summary.expiring_soon {
            println!(
                "  {} ({}) - {} day(s), {}",
                item.name, item.counterparty, item.days_remaining, item.expiration_date
            );
        }
    }
}

// =============================================================================
// UPLOAD COMMAND
// =============================================================================

/// Upload a document for the signed-in user.
pub async fn cmd_upload(settings: &Settings, path: &Path) -> Result<(), AppError> {
    let file = UploadFile::from_path(path).await?;
    let mut workspace = settings.workspace()?;
    let contract = workspace.upload(file).await?;

    if settings.json_mode {
        return print_json(&contract);
    }
    println!("Uploaded {} as {}", contract.name(), contract.id());
    println!(
        "  Expires {} ({}), status {}",
        contract.expiration_date(),
        contract.risk_level(),
        contract.status()
    );
    Ok(())
}

// =============================================================================
// CLASSIFY COMMAND
// =============================================================================

#[derive(Serialize)]
struct ClassifyOutput {
    reference: NaiveDate,
    expiration_date: NaiveDate,
    days_remaining: i64,
    risk_level: RiskLevel,
}

/// Classify one expiration date against the reference clock.
pub fn cmd_classify(settings: &Settings, expires: &str) -> Result<(), AppError> {
    let expiration_date = parse_expiration(expires)?;
    let reference = settings.clock.now();
    let days_remaining = days_until_date(reference, expiration_date);
    let output = ClassifyOutput {
        reference: reference.date_naive(),
        expiration_date,
        days_remaining,
        risk_level: tier_for_days(days_remaining),
    };

    if settings.json_mode {
        return print_json(&output);
    }
    println!(
        "{}: {} risk ({} day(s) from {})",
        output.expiration_date, output.risk_level, output.days_remaining, output.reference
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreKind;

    fn settings(today: &str) -> Settings {
        let mut config = PactwatchConfig::default();
        config.store.backend = StoreKind::Memory;
        config.session.user_id = Some("u-1".to_string());
        Settings {
            config,
            clock: Arc::new(FixedClock::at_date(parse_expiration(today).expect("date"))),
            json_mode: true,
        }
    }

    #[test]
    fn classify_accepts_dates() {
        let settings = settings("2026-01-01");
        assert!(cmd_classify(&settings, "2026-01-15").is_ok());
        assert!(matches!(
            cmd_classify(&settings, "soon"),
            Err(AppError::Core(_))
        ));
    }

    #[tokio::test]
    async fn list_on_empty_memory_store() {
        let settings = settings("2026-01-01");
        assert!(cmd_list(&settings, Some(RiskLevel::High), None, None).await.is_ok());
        assert!(cmd_dashboard(&settings).await.is_ok());
    }

    #[tokio::test]
    async fn list_without_user_is_no_session() {
        let mut settings = settings("2026-01-01");
        settings.config.session.user_id = None;
        assert!(matches!(
            cmd_dashboard(&settings).await,
            Err(AppError::NoSession)
        ));
    }
}

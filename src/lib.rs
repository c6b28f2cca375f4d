pub mod cli;
pub mod core;
pub mod store;

use crate::cli::{OutputFormat, RecordAction, RecordKind, metrics, records};
use crate::core::RecordId;
use crate::core::config::AppConfig;
use crate::store::Ledger;
use anyhow::Result;
use chrono::Local;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub enum AppCommand {
    Records(RecordKind, RecordAction),
    Irr { project_id: RecordId, record: bool },
    Pnl { project_id: Option<RecordId> },
    Dashboard,
}

/// Loads the configuration, opens the configured ledger and runs `command`.
pub async fn run_command(
    command: AppCommand,
    config_path: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    info!("solarfin starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load_or_default()?,
    };
    debug!("Loaded config: {config:#?}");

    let ledger = Ledger::from_config(&config)?;
    run_with_ledger(command, &ledger, &config, format).await
}

pub async fn run_with_ledger(
    command: AppCommand,
    ledger: &Ledger,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<()> {
    match command {
        AppCommand::Records(kind, action) => match kind {
            RecordKind::Project => records::run(&*ledger.projects, action, format).await,
            RecordKind::Payment => records::run(&*ledger.payments, action, format).await,
            RecordKind::Projection => records::run(&*ledger.projections, action, format).await,
            RecordKind::Supplier => records::run(&*ledger.suppliers, action, format).await,
            RecordKind::Component => {
                records::run(&*ledger.cost_components, action, format).await
            }
            RecordKind::SupplierComponent => {
                records::run(&*ledger.supplier_components, action, format).await
            }
            RecordKind::ProjectComponent => {
                records::run(&*ledger.project_components, action, format).await
            }
        },
        AppCommand::Irr { project_id, record } => {
            metrics::irr(ledger, project_id, record, format).await
        }
        AppCommand::Pnl { project_id } => {
            metrics::pnl(ledger, project_id, &config.currency, format).await
        }
        AppCommand::Dashboard => {
            metrics::dashboard(ledger, Local::now(), &config.currency, format).await
        }
    }
}

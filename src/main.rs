use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use solarfin::cli::{OutputFormat, RecordAction, RecordKind, setup::setup};
use solarfin::core::RecordId;
use solarfin::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for solarfin::AppCommand {
    fn from(cmd: Commands) -> solarfin::AppCommand {
        use solarfin::AppCommand::Records;
        match cmd {
            Commands::Project { action } => Records(RecordKind::Project, action),
            Commands::Payment { action } => Records(RecordKind::Payment, action),
            Commands::Projection { action } => Records(RecordKind::Projection, action),
            Commands::Supplier { action } => Records(RecordKind::Supplier, action),
            Commands::Component { action } => Records(RecordKind::Component, action),
            Commands::SupplierComponent { action } => {
                Records(RecordKind::SupplierComponent, action)
            }
            Commands::ProjectComponent { action } => {
                Records(RecordKind::ProjectComponent, action)
            }
            Commands::Irr { project_id, record } => {
                solarfin::AppCommand::Irr { project_id, record }
            }
            Commands::Pnl { project_id } => solarfin::AppCommand::Pnl { project_id },
            Commands::Dashboard => solarfin::AppCommand::Dashboard,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Manage installation projects
    Project {
        #[command(subcommand)]
        action: RecordAction,
    },
    /// Manage client and supplier payments
    Payment {
        #[command(subcommand)]
        action: RecordAction,
    },
    /// Manage monthly cash flow projections
    Projection {
        #[command(subcommand)]
        action: RecordAction,
    },
    /// Manage suppliers
    Supplier {
        #[command(subcommand)]
        action: RecordAction,
    },
    /// Manage the cost component catalogue
    Component {
        #[command(subcommand)]
        action: RecordAction,
    },
    /// Manage supplier offers for cost components
    SupplierComponent {
        #[command(subcommand)]
        action: RecordAction,
    },
    /// Manage components used by projects
    ProjectComponent {
        #[command(subcommand)]
        action: RecordAction,
    },
    /// Display the internal rate of return of a project
    Irr {
        project_id: RecordId,
        /// Save the result as the project's actual IRR
        #[arg(long)]
        record: bool,
    },
    /// Display profit and loss of a project, or of all payments
    Pnl { project_id: Option<RecordId> },
    /// Display portfolio figures for the current month
    Dashboard,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let format = OutputFormat::from_json_flag(cli.json);
    let result = match cli.command {
        Some(Commands::Setup) => setup(),
        Some(cmd) => solarfin::run_command(cmd.into(), cli.config_path.as_deref(), format).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}

use crate::config::AppConfig;
use crate::errors::AppResult;
use clap::{Parser, Subcommand};
use tracing::debug;

pub mod commands;

/// Customer lifecycle flow accounting reports
#[derive(Parser)]
#[command(name = "customer-flow-report")]
#[command(about = "Period delta snapshots, balances and transitions over classified customer history")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Load customer activity history from CSV
    Import(commands::import::ImportCommand),
    /// Compute delta snapshots for one period, a key range or a custom range
    Compute(commands::report::ComputeCommand),
    /// Group balances at a point in time (direct or summed)
    Balance(commands::report::BalanceCommand),
    /// Stored snapshots over a period-key range with a last-two comparison
    Trend(commands::report::TrendCommand),
    /// Transition matrix between two periods (optionally as a Sankey)
    Transition(commands::report::TransitionCommand),
    /// Upgraded, downgraded and unchanged group moves between two periods
    GroupChanges(commands::report::GroupChangesCommand),
    /// Queue periods for recomputation
    MarkDirty(commands::worker::MarkDirtyCommand),
    /// Recompute dirty periods once or on an interval
    Worker(commands::worker::WorkerCommand),
    /// Database statistics
    Stats(commands::report::StatsCommand),
}

pub async fn run() -> AppResult<()> {
    // RUST_LOG controls verbosity (defaults to "error")
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("error")),
        )
        .try_init();

    let cli = Cli::parse();
    let app_config = AppConfig::get_defaults()?;
    debug!("Configuration: {:?}", app_config);

    match cli.command {
        Commands::Import(command) => command.run(&app_config),
        Commands::Compute(command) => command.run(&app_config),
        Commands::Balance(command) => command.run(&app_config),
        Commands::Trend(command) => command.run(&app_config),
        Commands::Transition(command) => command.run(&app_config),
        Commands::GroupChanges(command) => command.run(&app_config),
        Commands::MarkDirty(command) => command.run(&app_config),
        Commands::Worker(command) => command.run(&app_config).await,
        Commands::Stats(command) => command.run(&app_config),
    }
}

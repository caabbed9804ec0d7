use super::{parse_format, parse_instant, CommonArgs};
use crate::analysis::{BalanceStrategy, ReportEngine, ReportFormatter};
use crate::config::AppConfig;
use crate::database::StatisticsOperations;
use crate::errors::{AppError, AppResult};
use crate::types::{Dimension, PeriodType};
use clap::Args;

/// Open the engine, run `analyse_fn` and print or write the formatted result
fn run_report<T, F, G>(
    common: &CommonArgs,
    app_config: &AppConfig,
    description: &str,
    analyse_fn: F,
    format_fn: G,
) -> AppResult<()>
where
    F: FnOnce(&ReportEngine) -> AppResult<T>,
    G: FnOnce(&T, &crate::analysis::OutputFormat) -> AppResult<String>,
{
    let format = parse_format(&common.format)?;
    let engine = common.open_engine(app_config)?;
    let result = analyse_fn(&engine)?;
    common.emit(&format_fn(&result, &format)?, description)
}

/// Compute and persist delta snapshots
#[derive(Args)]
pub struct ComputeCommand {
    #[arg(long)]
    owner: String,

    /// day, week, month or year (or a customer_* report key)
    #[arg(long, default_value = "day")]
    period_type: String,

    /// First period key
    #[arg(long, conflicts_with_all = ["start", "end"])]
    from: Option<String>,

    /// Last period key (defaults to --from)
    #[arg(long, requires = "from")]
    to: Option<String>,

    /// Custom range start (timestamp or YYYY-MM-DD)
    #[arg(long, requires = "end")]
    start: Option<String>,

    /// Custom range end, inclusive (timestamp or YYYY-MM-DD)
    #[arg(long, requires = "start")]
    end: Option<String>,

    #[command(flatten)]
    common: CommonArgs,
}

impl ComputeCommand {
    pub fn run(&self, app_config: &AppConfig) -> AppResult<()> {
        let period_type: PeriodType = self.period_type.parse()?;

        run_report(
            &self.common,
            app_config,
            "Delta snapshots",
            |engine| match (&self.from, &self.start, &self.end) {
                (Some(from), _, _) => {
                    let to = self.to.as_deref().unwrap_or(from);
                    engine.compute_range(&self.owner, period_type, from, to)
                }
                (None, Some(start), Some(end)) => {
                    let start_ms = parse_instant(start, false)?;
                    let end_ms = parse_instant(end, true)?;
                    Ok(vec![engine.compute_delta(&self.owner, start_ms, end_ms, period_type)?])
                }
                _ => Err(AppError::Config(
                    "Provide --from [--to] period keys or --start and --end".to_string(),
                )),
            },
            |documents, format| ReportFormatter::format_deltas(documents, format),
        )
    }
}

/// Group balances at a point in time
#[derive(Args)]
pub struct BalanceCommand {
    #[arg(long)]
    owner: String,

    /// Point in time (timestamp or YYYY-MM-DD, end of that day)
    #[arg(long)]
    as_of: String,

    /// direct (replay classifications) or summed (fold delta snapshots)
    #[arg(long, default_value = "direct")]
    strategy: String,

    /// Summed only: start of the folded range (defaults to the first activity's year)
    #[arg(long)]
    from: Option<String>,

    #[command(flatten)]
    common: CommonArgs,
}

impl BalanceCommand {
    fn strategy(&self) -> AppResult<BalanceStrategy> {
        match self.strategy.to_lowercase().as_str() {
            "direct" => Ok(BalanceStrategy::Direct),
            "summed" => Ok(BalanceStrategy::Summed {
                from_ms: self
                    .from
                    .as_deref()
                    .map(|from| parse_instant(from, false))
                    .transpose()?,
            }),
            other => Err(AppError::Unknown {
                kind: "balance strategy",
                value: other.to_string(),
            }),
        }
    }

    pub fn run(&self, app_config: &AppConfig) -> AppResult<()> {
        let strategy = self.strategy()?;
        let as_of_ms = parse_instant(&self.as_of, true)?;

        run_report(
            &self.common,
            app_config,
            "Balance",
            |engine| engine.get_balance(&self.owner, as_of_ms, strategy),
            ReportFormatter::format_balance,
        )
    }
}

/// Stored snapshots over a period-key range
#[derive(Args)]
pub struct TrendCommand {
    #[arg(long)]
    owner: String,

    /// customer_daily, customer_weekly, customer_monthly or customer_yearly
    #[arg(long, default_value = "customer_daily")]
    report_key: String,

    #[arg(long)]
    from: String,

    #[arg(long)]
    to: String,

    #[command(flatten)]
    common: CommonArgs,
}

impl TrendCommand {
    pub fn run(&self, app_config: &AppConfig) -> AppResult<()> {
        run_report(
            &self.common,
            app_config,
            "Trend",
            |engine| engine.get_trend(&self.owner, &self.report_key, &self.from, &self.to),
            ReportFormatter::format_trend,
        )
    }
}

/// Arguments shared by the transition commands
#[derive(Args, Debug, Clone)]
pub struct TransitionArgs {
    #[arg(long)]
    owner: String,

    /// Earlier period key
    #[arg(long)]
    from: String,

    /// Later period key
    #[arg(long)]
    to: String,

    /// Inferred from the key shape when omitted
    #[arg(long)]
    period_type: Option<String>,

    /// journey, value, lifecycle, channel, loyalty, momentum or ceoGroup
    #[arg(long, default_value = "value")]
    dimension: String,
}

impl TransitionArgs {
    fn parsed(&self) -> AppResult<(Option<PeriodType>, Dimension)> {
        let period_type = self
            .period_type
            .as_deref()
            .map(str::parse::<PeriodType>)
            .transpose()?;
        Ok((period_type, self.dimension.parse()?))
    }
}

/// Transition matrix between two periods
#[derive(Args)]
pub struct TransitionCommand {
    #[command(flatten)]
    args: TransitionArgs,

    /// Include Sankey nodes and links (always on for plotly output)
    #[arg(long)]
    sankey: bool,

    #[command(flatten)]
    common: CommonArgs,
}

impl TransitionCommand {
    pub fn run(&self, app_config: &AppConfig) -> AppResult<()> {
        let (period_type, dimension) = self.args.parsed()?;
        let include_sankey = self.sankey || self.common.format.eq_ignore_ascii_case("plotly");

        run_report(
            &self.common,
            app_config,
            "Transition matrix",
            |engine| {
                engine.get_transition_matrix(
                    &self.args.owner,
                    &self.args.from,
                    &self.args.to,
                    period_type,
                    dimension,
                    include_sankey,
                )
            },
            ReportFormatter::format_transition_matrix,
        )
    }
}

/// Upgraded, downgraded and unchanged group moves between two periods
#[derive(Args)]
pub struct GroupChangesCommand {
    #[command(flatten)]
    args: TransitionArgs,

    #[command(flatten)]
    common: CommonArgs,
}

impl GroupChangesCommand {
    pub fn run(&self, app_config: &AppConfig) -> AppResult<()> {
        let (period_type, dimension) = self.args.parsed()?;

        run_report(
            &self.common,
            app_config,
            "Group changes",
            |engine| {
                engine.get_group_changes(
                    &self.args.owner,
                    &self.args.from,
                    &self.args.to,
                    period_type,
                    dimension,
                )
            },
            ReportFormatter::format_group_changes,
        )
    }
}

/// Database statistics
#[derive(Args)]
pub struct StatsCommand {
    #[command(flatten)]
    common: CommonArgs,
}

impl StatsCommand {
    pub fn run(&self, app_config: &AppConfig) -> AppResult<()> {
        run_report(
            &self.common,
            app_config,
            "Database statistics",
            |engine| engine.store().get_database_stats(),
            ReportFormatter::format_database_stats,
        )
    }
}

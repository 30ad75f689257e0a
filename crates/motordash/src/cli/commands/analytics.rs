use anyhow::{Context, Error, Result};
use clap::{Args, Subcommand};
use rusqlite::Connection;

use crate::analytics::{self, DateRange};
use crate::config::RuntimePaths;
use crate::db;
use crate::models::{QueryReport, ReportCommandFailure};
use crate::utils::time::parse_iso_date;

#[derive(Debug, Clone, Args)]
pub struct AnalyticsArgs {
    #[command(subcommand)]
    pub command: AnalyticsCommand,
}

#[derive(Debug, Clone, Subcommand)]
pub enum AnalyticsCommand {
    Summary(RangeArgs),
    TopVehicles(TopVehiclesArgs),
    Regions(RangeArgs),
    Segments(RangeArgs),
    Monthly(MonthlyArgs),
    InventoryStatus,
}

#[derive(Debug, Clone, Args)]
pub struct RangeArgs {
    /// Inclusive start of the sale-date window (YYYY-MM-DD).
    #[arg(long, value_name = "DATE")]
    pub start: Option<String>,

    /// Inclusive end of the sale-date window (YYYY-MM-DD).
    #[arg(long, value_name = "DATE")]
    pub end: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct TopVehiclesArgs {
    #[command(flatten)]
    pub range: RangeArgs,

    #[arg(long, default_value_t = 10)]
    pub limit: usize,
}

#[derive(Debug, Clone, Args)]
pub struct MonthlyArgs {
    #[arg(long)]
    pub year: i32,
}

pub fn run(args: &AnalyticsArgs, runtime_paths: &RuntimePaths) -> Result<()> {
    let query = match &args.command {
        AnalyticsCommand::Summary(range) => analytics::sales_summary(&date_range(range)?),
        AnalyticsCommand::TopVehicles(top) => {
            analytics::top_selling_vehicles(top.limit, &date_range(&top.range)?)
        }
        AnalyticsCommand::Regions(range) => analytics::sales_by_region(&date_range(range)?),
        AnalyticsCommand::Segments(range) => {
            analytics::sales_by_customer_segment(&date_range(range)?)
        }
        AnalyticsCommand::Monthly(monthly) => analytics::monthly_sales_trend(monthly.year),
        AnalyticsCommand::InventoryStatus => analytics::inventory_status(),
    };

    let connection = open_store(runtime_paths)?;
    let report = analytics::run(&connection, &query).map_err(|error| {
        Error::new(ReportCommandFailure::new(
            QueryReport::failure(format!("{} failed: {error}", query.name))
                .with_query(query.sql.trim()),
        ))
    })?;

    let encoded = serde_json::to_string(&report).context("failed to encode analytics report")?;
    println!("{encoded}");
    Ok(())
}

fn open_store(runtime_paths: &RuntimePaths) -> Result<Connection> {
    let connection = db::open_connection(&runtime_paths.db_path).map_err(|error| {
        Error::new(ReportCommandFailure::new(QueryReport::failure(format!(
            "unable to open analytics store: {error:#}"
        ))))
    })?;
    db::ensure_schema(&connection).map_err(|error| {
        Error::new(ReportCommandFailure::new(QueryReport::failure(format!(
            "unable to prepare analytics store: {error:#}"
        ))))
    })?;
    Ok(connection)
}

fn date_range(args: &RangeArgs) -> Result<DateRange> {
    for bound in [args.start.as_deref(), args.end.as_deref()].into_iter().flatten() {
        parse_iso_date(bound).map_err(|error| {
            Error::new(ReportCommandFailure::new(QueryReport::failure(format!(
                "invalid date filter: {error}"
            ))))
        })?;
    }

    Ok(DateRange {
        start: args.start.clone(),
        end: args.end.clone(),
    })
}

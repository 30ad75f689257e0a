use anyhow::{Context, Error, Result};
use clap::Args;

use crate::config::RuntimePaths;
use crate::db;
use crate::models::{QueryReport, ReportCommandFailure};
use crate::seed::{SeedPlan, seed_database};
use crate::utils::time::{parse_iso_date, utc_today};

#[derive(Debug, Clone, Args)]
pub struct SeedArgs {
    #[arg(long, default_value_t = 60)]
    pub vehicles: usize,

    #[arg(long, default_value_t = 120)]
    pub days: u32,

    /// Final sale date of the generated window (YYYY-MM-DD); defaults to today.
    #[arg(long, value_name = "DATE")]
    pub as_of: Option<String>,
}

pub fn run(args: &SeedArgs, runtime_paths: &RuntimePaths) -> Result<()> {
    let as_of = match args.as_of.as_deref() {
        Some(raw) => parse_iso_date(raw).map_err(|error| {
            Error::new(ReportCommandFailure::new(QueryReport::failure(format!(
                "invalid --as-of date: {error}"
            ))))
        })?,
        None => utc_today(),
    };

    if args.vehicles == 0 || args.days == 0 {
        return Err(Error::new(ReportCommandFailure::new(QueryReport::failure(
            "seed plan needs at least one vehicle and one day",
        ))));
    }

    let plan = SeedPlan {
        vehicles: args.vehicles,
        days: args.days,
        as_of,
    };

    let mut connection = db::open_connection(&runtime_paths.db_path).map_err(|error| {
        Error::new(ReportCommandFailure::new(QueryReport::failure(format!(
            "unable to open analytics store: {error:#}"
        ))))
    })?;

    let stats = seed_database(&mut connection, &plan).map_err(|error| {
        Error::new(ReportCommandFailure::new(QueryReport::failure(format!(
            "seeding failed: {error:#}"
        ))))
    })?;

    let row = serde_json::to_value(stats).context("failed to encode seed stats")?;
    let report = QueryReport::success(String::new(), vec![row], 0);
    let encoded = serde_json::to_string(&report).context("failed to encode seed report")?;
    println!("{encoded}");
    Ok(())
}

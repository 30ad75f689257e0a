use std::time::Instant;

use anyhow::{Context, Error, Result};
use clap::{Args, Subcommand};

use crate::catalog;
use crate::config::RuntimePaths;
use crate::db;
use crate::models::{QueryReport, ReportCommandFailure};

#[derive(Debug, Clone, Args)]
pub struct QueryArgs {
    #[command(subcommand)]
    pub command: QueryCommand,
}

#[derive(Debug, Clone, Subcommand)]
pub enum QueryCommand {
    Sql(QuerySqlArgs),
    Schema(QuerySchemaArgs),
    Catalog,
}

#[derive(Debug, Clone, Args)]
pub struct QuerySqlArgs {
    #[arg(value_name = "SQL")]
    pub sql: String,

    #[arg(long, value_name = "JSON")]
    pub params: Option<String>,

    #[arg(long, default_value_t = 1_000)]
    pub row_cap: usize,
}

#[derive(Debug, Clone, Args)]
pub struct QuerySchemaArgs {
    #[arg(long, default_value_t = false)]
    pub include_internal: bool,
}

pub fn run(args: &QueryArgs, runtime_paths: &RuntimePaths) -> Result<()> {
    match &args.command {
        QueryCommand::Sql(sql_args) => run_sql_query(sql_args, runtime_paths),
        QueryCommand::Schema(schema_args) => run_schema_query(schema_args, runtime_paths),
        QueryCommand::Catalog => run_catalog_query(),
    }
}

fn run_sql_query(args: &QuerySqlArgs, runtime_paths: &RuntimePaths) -> Result<()> {
    if let Err(violation) = db::validate_read_only(&args.sql) {
        let report = QueryReport::failure(format!("Query validation failed: {violation}"))
            .with_query(args.sql.clone());
        return Err(Error::new(ReportCommandFailure::new(report)));
    }

    if args.row_cap == 0 {
        let report = QueryReport::failure("row_cap must be greater than zero")
            .with_query(args.sql.clone());
        return Err(Error::new(ReportCommandFailure::new(report)));
    }

    let params = db::parse_query_params(args.params.as_deref()).map_err(|error| {
        Error::new(ReportCommandFailure::new(
            QueryReport::failure(format!("invalid query params: {error:#}"))
                .with_query(args.sql.clone()),
        ))
    })?;

    let connection = db::open_connection(&runtime_paths.db_path).map_err(|error| {
        Error::new(ReportCommandFailure::new(
            QueryReport::failure(format!("unable to open analytics store: {error:#}"))
                .with_query(args.sql.clone()),
        ))
    })?;
    db::ensure_schema(&connection).map_err(|error| {
        Error::new(ReportCommandFailure::new(
            QueryReport::failure(format!("unable to prepare analytics store: {error:#}"))
                .with_query(args.sql.clone()),
        ))
    })?;

    let started = Instant::now();
    let outcome = db::execute_read_only(&connection, &args.sql, &params, Some(args.row_cap))
        .map_err(|error| {
            Error::new(ReportCommandFailure::new(
                QueryReport::failure(format!("Query execution failed: {error}"))
                    .with_query(args.sql.clone()),
            ))
        })?;
    let execution_time_ms = started.elapsed().as_millis() as u64;

    let report = QueryReport::success(args.sql.clone(), outcome.rows, execution_time_ms)
        .with_truncated(outcome.truncated);
    print_report(&report)
}

fn run_schema_query(args: &QuerySchemaArgs, runtime_paths: &RuntimePaths) -> Result<()> {
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

    let started = Instant::now();
    let columns = db::describe_schema(&connection, args.include_internal).map_err(|error| {
        Error::new(ReportCommandFailure::new(QueryReport::failure(format!(
            "schema introspection failed: {error:#}"
        ))))
    })?;
    let execution_time_ms = started.elapsed().as_millis() as u64;

    let rows = columns
        .iter()
        .map(|column| serde_json::to_value(column).context("failed to encode schema row"))
        .collect::<Result<Vec<_>>>()?;
    let report = QueryReport::success(
        "SELECT name, type FROM sqlite_schema WHERE type IN ('table', 'view')",
        rows,
        execution_time_ms,
    );
    print_report(&report)
}

fn run_catalog_query() -> Result<()> {
    let rows = catalog::catalog_rows()
        .iter()
        .map(|row| serde_json::to_value(row).context("failed to encode catalog row"))
        .collect::<Result<Vec<_>>>()?;
    let report = QueryReport::success(String::new(), rows, 0);
    print_report(&report)
}

fn print_report(report: &QueryReport) -> Result<()> {
    let encoded = serde_json::to_string(report).context("failed to encode query report")?;
    println!("{encoded}");
    Ok(())
}

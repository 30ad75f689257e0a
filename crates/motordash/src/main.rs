#![forbid(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Parser;
use clap::error::ErrorKind;
use motordash::cli::app::{Cli, Command, RuntimeArgs};
use motordash::cli::commands;
use motordash::config::RuntimePaths;
use tracing_subscriber::EnvFilter;

const EXIT_SUCCESS: i32 = 0;
const EXIT_RUNTIME_FAILURE: i32 = 1;
const EXIT_USAGE_ERROR: i32 = 64;

fn main() {
    std::process::exit(run());
}

fn run() -> i32 {
    init_tracing();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => return exit_code_for_parse_error(error),
    };

    match execute(cli) {
        Ok(()) => EXIT_SUCCESS,
        Err(error) => {
            eprintln!("{error:#}");
            EXIT_RUNTIME_FAILURE
        }
    }
}

// Envelopes go to stdout; diagnostics stay on stderr.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn execute(cli: Cli) -> Result<()> {
    let runtime_paths = resolve_runtime_paths(&cli.runtime)?;
    match cli.command {
        Command::Ask(args) => commands::ask::run(&args, &runtime_paths),
        Command::Query(args) => commands::query::run(&args, &runtime_paths),
        Command::Analytics(args) => commands::analytics::run(&args, &runtime_paths),
        Command::Seed(args) => commands::seed::run(&args, &runtime_paths),
    }
}

fn exit_code_for_parse_error(error: clap::Error) -> i32 {
    match error.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            let _ = error.print();
            EXIT_SUCCESS
        }
        _ => {
            let _ = error.print();
            EXIT_USAGE_ERROR
        }
    }
}

fn resolve_runtime_paths(args: &RuntimeArgs) -> Result<RuntimePaths> {
    let home_dir = match &args.home_dir {
        Some(path) => path.clone(),
        None => std::env::var_os("HOME")
            .map(PathBuf::from)
            .ok_or_else(|| anyhow!("HOME is not set; pass --home-dir"))?,
    };

    let cwd = std::env::current_dir()?;
    motordash::config::resolve_runtime_paths(&home_dir, &cwd, args.db.as_deref())
}

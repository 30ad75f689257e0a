use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use super::commands::{
    analytics::AnalyticsArgs, ask::AskArgs, query::QueryArgs, seed::SeedArgs,
};

#[derive(Debug, Parser)]
#[command(name = "motordash", version, about = "Automotive sales and inventory analytics")]
pub struct Cli {
    #[command(flatten)]
    pub runtime: RuntimeArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Args)]
pub struct RuntimeArgs {
    #[arg(long, global = true, value_name = "PATH")]
    pub home_dir: Option<PathBuf>,

    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Ask(AskArgs),
    Query(QueryArgs),
    Analytics(AnalyticsArgs),
    Seed(SeedArgs),
}

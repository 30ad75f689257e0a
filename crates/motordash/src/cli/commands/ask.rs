use anyhow::{Context, Result};
use clap::Args;

use crate::config::{LlmSettings, RuntimePaths};
use crate::db;
use crate::llm::OpenAiChatClient;
use crate::nlquery::NlQueryPipeline;

#[derive(Debug, Clone, Args)]
pub struct AskArgs {
    #[arg(value_name = "QUESTION")]
    pub question: String,

    /// Skip the follow-up completion that narrates the result rows.
    #[arg(long, default_value_t = false)]
    pub no_explain: bool,
}

pub fn run(args: &AskArgs, runtime_paths: &RuntimePaths) -> Result<()> {
    let settings = LlmSettings::from_env()?;
    let client = OpenAiChatClient::new(&settings)?;

    let connection = db::open_connection(&runtime_paths.db_path)?;
    db::ensure_schema(&connection)?;

    let pipeline = NlQueryPipeline::new(&client, &connection);
    let report = pipeline.process(&args.question, !args.no_explain);

    let encoded = serde_json::to_string(&report).context("failed to encode query report")?;
    println!("{encoded}");

    Ok(())
}

//! Natural-language query pipeline: question in, result envelope out.
//!
//! `process` is total over non-empty questions: synthesis failures, guardrail
//! rejections, and execution failures all come back as `success: false`
//! reports; nothing propagates to the caller.

use rusqlite::Connection;
use std::time::Instant;
use tracing::{info, warn};

use crate::db;
use crate::llm::{CompletionClient, SqlSynthesizer};
use crate::models::QueryReport;

const EXPLANATION_FALLBACK: &str = "Results retrieved successfully.";

pub struct NlQueryPipeline<'a> {
    client: &'a dyn CompletionClient,
    connection: &'a Connection,
}

impl<'a> NlQueryPipeline<'a> {
    #[must_use]
    pub fn new(client: &'a dyn CompletionClient, connection: &'a Connection) -> Self {
        Self { client, connection }
    }

    #[must_use]
    pub fn process(&self, question: &str, explain: bool) -> QueryReport {
        let question = question.trim();
        if question.is_empty() {
            return QueryReport::failure("question must not be empty");
        }
        info!(question = %question, "processing natural language query");

        let synthesizer = SqlSynthesizer::new(self.client);
        let sql = match synthesizer.synthesize(question) {
            Ok(sql) => sql,
            Err(error) => {
                warn!(error = %error, "SQL synthesis failed");
                return QueryReport::failure(format!("Could not generate SQL query: {error}"))
                    .with_question(question);
            }
        };

        if let Err(violation) = db::validate_read_only(&sql) {
            warn!(sql = %sql, violation = %violation, "synthesized SQL rejected");
            return QueryReport::failure(format!("Query validation failed: {violation}"))
                .with_question(question)
                .with_query(sql);
        }

        let started = Instant::now();
        let outcome = match db::execute_read_only(self.connection, &sql, &[], None) {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!(sql = %sql, error = %error, "query execution failed");
                return QueryReport::failure(format!("Query execution failed: {error}"))
                    .with_question(question)
                    .with_query(sql);
            }
        };
        let execution_time_ms = started.elapsed().as_millis() as u64;
        info!(rows = outcome.row_count, execution_time_ms, "query executed");

        let mut report =
            QueryReport::success(sql, outcome.rows, execution_time_ms).with_question(question);
        if explain {
            let explanation = synthesizer
                .explain(question, &report.rows)
                .unwrap_or_else(|error| {
                    warn!(error = %error, "explanation generation failed");
                    EXPLANATION_FALLBACK.to_string()
                });
            report = report.with_explanation(explanation);
        }
        report
    }
}

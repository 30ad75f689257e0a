use std::fmt::{Display, Formatter};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Uniform result record for every query surface: the NL pipeline, raw SQL,
/// analytics reports, and seeding all serialize one of these to stdout.
///
/// Exactly one of the two shapes is ever produced:
/// success with rows, or failure with a non-empty `error` and empty rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct QueryReport {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,

    /// SQL text that was (or would have been) executed. Empty when the
    /// failure happened before any statement existed.
    pub query: String,

    pub rows: Vec<Value>,
    pub row_count: usize,
    pub execution_time_ms: u64,

    #[serde(default, skip_serializing_if = "is_false")]
    pub truncated: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl QueryReport {
    #[must_use]
    pub fn success(query: impl Into<String>, rows: Vec<Value>, execution_time_ms: u64) -> Self {
        let row_count = rows.len();
        Self {
            success: true,
            question: None,
            query: query.into(),
            rows,
            row_count,
            execution_time_ms,
            truncated: false,
            explanation: None,
            error: None,
        }
    }

    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            question: None,
            query: String::new(),
            rows: Vec::new(),
            row_count: 0,
            execution_time_ms: 0,
            truncated: false,
            explanation: None,
            error: Some(message.into()),
        }
    }

    #[must_use]
    pub fn with_question(mut self, question: impl Into<String>) -> Self {
        self.question = Some(question.into());
        self
    }

    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    #[must_use]
    pub fn with_truncated(mut self, truncated: bool) -> Self {
        self.truncated = truncated;
        self
    }

    #[must_use]
    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }
}

/// Error wrapper that renders the failed report as its JSON envelope, so a
/// command failure reaching `main` still prints machine-readable output.
#[derive(Debug, Clone)]
pub struct ReportCommandFailure {
    report: QueryReport,
}

impl ReportCommandFailure {
    #[must_use]
    pub fn new(report: QueryReport) -> Self {
        Self { report }
    }

    #[must_use]
    pub fn report(&self) -> &QueryReport {
        &self.report
    }
}

impl Display for ReportCommandFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match serde_json::to_string(&self.report) {
            Ok(encoded) => f.write_str(&encoded),
            Err(_) => f.write_str("query report serialization failure"),
        }
    }
}

impl std::error::Error for ReportCommandFailure {}

#[must_use]
pub fn json_schema() -> Value {
    let schema = schemars::schema_for!(QueryReport);
    match serde_json::to_value(schema) {
        Ok(value) => value,
        Err(error) => {
            panic!("failed to serialize generated query report schema: {error}");
        }
    }
}

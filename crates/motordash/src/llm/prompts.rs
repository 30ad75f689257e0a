use regex::Regex;
use serde_json::Value;

use crate::catalog;

/// Number of result rows shown to the model when asking for an explanation.
pub const EXPLANATION_PREVIEW_ROWS: usize = 10;

/// System instruction for SQL synthesis: role, grounding schema, vocabulary,
/// and few-shot question/SQL pairs. Identical output on every call.
#[must_use]
pub fn sql_generation_system_prompt() -> String {
    let mut prompt = String::from(
        "You are an expert SQL query generator for an automotive analytics database.\n\n",
    );
    prompt.push_str(&catalog::schema_context());
    prompt.push_str(
        "\nGenerate safe, read-only SQL queries (SELECT only). \
         Always include appropriate JOINs when needed.\n\nExamples:\n",
    );
    for example in catalog::FEW_SHOT_EXAMPLES {
        prompt.push_str(&format!("Q: {}\nSQL: {}\n", example.question, example.sql));
    }
    prompt
}

#[must_use]
pub fn nl_query_prompt(question: &str) -> String {
    format!(
        "Convert the following natural language question into a SQL query:\n\n\
         Question: {question}\n\n\
         Generate a single read-only SELECT query that answers the question. \
         If the question cannot be answered with the available data, explain why."
    )
}

#[must_use]
pub fn data_explanation_prompt(question: &str, rows: &[Value]) -> String {
    let preview = &rows[..rows.len().min(EXPLANATION_PREVIEW_ROWS)];
    let mut data = serde_json::to_string_pretty(preview).unwrap_or_else(|_| "[]".to_string());
    if rows.len() > EXPLANATION_PREVIEW_ROWS {
        data.push_str(&format!(
            "\n... and {} more rows",
            rows.len() - EXPLANATION_PREVIEW_ROWS
        ));
    }

    format!(
        "A user asked: \"{question}\"\n\n\
         Here is the data result:\n{data}\n\n\
         Provide 3-5 concise bullet points (maximum 20 words each) that tell the story \
         of this data. Include specific numbers and focus on the insights that answer \
         the user's question."
    )
}

/// Extracts the single SQL statement from a model completion: strips any
/// markdown code fences, then collects from the first `SELECT`/`WITH` line
/// through a terminating semicolon. Returns an empty string when no
/// statement is present.
#[must_use]
pub fn extract_sql(completion: &str) -> String {
    let fence = Regex::new(r"```[a-zA-Z]*\n?").expect("fence pattern is valid");
    let stripped = fence.replace_all(completion, "");

    let mut sql_lines = Vec::new();
    let mut in_query = false;
    for line in stripped.lines() {
        let line = line.trim();
        let upper = line.to_uppercase();
        if upper.starts_with("SELECT") || upper.starts_with("WITH") {
            in_query = true;
        }
        if in_query {
            sql_lines.push(line);
            if line.ends_with(';') {
                break;
            }
        }
    }

    sql_lines.join(" ").trim().to_string()
}

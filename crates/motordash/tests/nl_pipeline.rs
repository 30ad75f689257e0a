use motordash::db;
use motordash::llm::{CompletionClient, CompletionRequest, SynthesisError};
use motordash::models::QueryReport;
use motordash::nlquery::NlQueryPipeline;
use motordash::seed::{SeedPlan, build_sales, build_vehicles, seed_database};
use rusqlite::Connection;
use time::{Date, Month};

struct FixedCompletion(&'static str);

impl CompletionClient for FixedCompletion {
    fn complete(&self, _request: &CompletionRequest) -> Result<String, SynthesisError> {
        Ok(self.0.to_string())
    }
}

struct FailingCompletion;

impl CompletionClient for FailingCompletion {
    fn complete(&self, _request: &CompletionRequest) -> Result<String, SynthesisError> {
        Err(SynthesisError::new("connection refused"))
    }
}

/// Answers the synthesis prompt with SQL and the explanation prompt with
/// narrative text, mirroring the two completions of an explained ask.
struct ScriptedCompletion;

impl CompletionClient for ScriptedCompletion {
    fn complete(&self, request: &CompletionRequest) -> Result<String, SynthesisError> {
        if request.user_prompt.starts_with("Convert the following") {
            Ok("SELECT COUNT(*) AS sale_count FROM sales;".to_string())
        } else {
            Ok("- One aggregate row summarizing sale volume.".to_string())
        }
    }
}

struct ExplainRefusedCompletion;

impl CompletionClient for ExplainRefusedCompletion {
    fn complete(&self, request: &CompletionRequest) -> Result<String, SynthesisError> {
        if request.user_prompt.starts_with("Convert the following") {
            Ok("SELECT COUNT(*) AS sale_count FROM sales;".to_string())
        } else {
            Err(SynthesisError::new("rate limited"))
        }
    }
}

fn fixture_plan() -> SeedPlan {
    SeedPlan {
        vehicles: 24,
        days: 90,
        as_of: Date::from_calendar_date(2026, Month::July, 31).expect("fixture date is valid"),
    }
}

fn seeded_connection() -> Connection {
    let mut connection = Connection::open_in_memory().expect("in-memory sqlite should open");
    seed_database(&mut connection, &fixture_plan()).expect("seeding should succeed");
    connection
}

fn empty_connection() -> Connection {
    let connection = Connection::open_in_memory().expect("in-memory sqlite should open");
    db::ensure_schema(&connection).expect("schema creation should succeed");
    connection
}

/// Exactly one of success-with-rows or failure-with-error, never both.
fn assert_envelope_invariant(report: &QueryReport) {
    if report.success {
        assert!(report.error.is_none(), "success report carries an error");
    } else {
        assert!(
            report.error.as_deref().is_some_and(|m| !m.is_empty()),
            "failure report lacks an error message"
        );
        assert!(report.rows.is_empty(), "failure report carries rows");
        assert_eq!(report.row_count, 0);
        assert_eq!(report.execution_time_ms, 0);
    }
}

#[test]
fn seeded_aggregate_matches_fixture_total() {
    let connection = seeded_connection();
    let plan = fixture_plan();
    let expected: f64 = build_sales(&build_vehicles(plan.vehicles), &plan)
        .iter()
        .filter(|sale| {
            sale.sale_date.as_str() >= "2026-06-01" && sale.sale_date.as_str() <= "2026-06-30"
        })
        .map(|sale| sale.total_amount)
        .sum();
    assert!(expected > 0.0, "fixture month should contain sales");

    let client = FixedCompletion(
        "SELECT SUM(total_amount) AS total_revenue FROM sales \
         WHERE sale_date >= '2026-06-01' AND sale_date <= '2026-06-30';",
    );
    let pipeline = NlQueryPipeline::new(&client, &connection);
    let report = pipeline.process("What was total sales revenue last month?", false);

    assert_envelope_invariant(&report);
    assert!(report.success, "aggregate query should succeed: {:?}", report.error);
    assert_eq!(report.row_count, 1);
    let total = report.rows[0]
        .pointer("/total_revenue")
        .and_then(|value| value.as_f64())
        .expect("aggregate row should carry total_revenue");
    assert!(
        (total - expected).abs() < 1e-6,
        "expected {expected}, store returned {total}"
    );
    assert_eq!(
        report.question.as_deref(),
        Some("What was total sales revenue last month?")
    );
}

#[test]
fn markdown_wrapped_completion_executes_the_bare_statement() {
    let connection = empty_connection();
    let client = FixedCompletion("```sql\nSELECT 1\n```");
    let pipeline = NlQueryPipeline::new(&client, &connection);
    let report = pipeline.process("select one", false);

    assert_envelope_invariant(&report);
    assert!(report.success);
    assert_eq!(report.query, "SELECT 1");
    assert_eq!(report.row_count, 1);
    assert_eq!(
        report.rows[0].pointer("/1").and_then(|value| value.as_i64()),
        Some(1)
    );
}

#[test]
fn keyword_typo_fails_synthesis_without_executing() {
    let connection = empty_connection();
    let client = FixedCompletion("SELEC * FROM sales");
    let pipeline = NlQueryPipeline::new(&client, &connection);
    let report = pipeline.process("all sales", false);

    assert_envelope_invariant(&report);
    assert!(!report.success);
    assert!(report.query.is_empty(), "no statement should reach the executor");
    assert!(
        report
            .error
            .as_deref()
            .is_some_and(|m| m.contains("Could not generate SQL query"))
    );
}

#[test]
fn unknown_table_fails_execution_with_error_and_empty_rows() {
    let connection = empty_connection();
    let client = FixedCompletion("SELECT * FROM salez");
    let pipeline = NlQueryPipeline::new(&client, &connection);
    let report = pipeline.process("all salez", false);

    assert_envelope_invariant(&report);
    assert!(!report.success);
    assert_eq!(report.query, "SELECT * FROM salez");
    assert!(
        report
            .error
            .as_deref()
            .is_some_and(|m| m.contains("Query execution failed")),
        "unexpected error: {:?}",
        report.error
    );
}

#[test]
fn empty_completion_after_fence_stripping_never_reaches_the_store() {
    let connection = empty_connection();
    let client = FixedCompletion("```sql\n```");
    let pipeline = NlQueryPipeline::new(&client, &connection);
    let report = pipeline.process("anything", false);

    assert_envelope_invariant(&report);
    assert!(!report.success);
    assert!(report.query.is_empty());
}

#[test]
fn multi_statement_completion_is_rejected_by_the_guardrail() {
    let connection = seeded_connection();
    let client = FixedCompletion("SELECT 1; DROP TABLE sales");
    let pipeline = NlQueryPipeline::new(&client, &connection);
    let report = pipeline.process("count then drop", false);

    assert_envelope_invariant(&report);
    assert!(!report.success);
    assert!(
        report
            .error
            .as_deref()
            .is_some_and(|m| m.contains("Query validation failed"))
    );

    // The guardrail fired before execution; the store keeps its tables.
    let sales_table_intact = connection
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'sales'",
            [],
            |_| Ok(()),
        )
        .is_ok();
    assert!(sales_table_intact);
}

#[test]
fn synthesis_outage_collapses_into_the_error_field() {
    let connection = empty_connection();
    let pipeline = NlQueryPipeline::new(&FailingCompletion, &connection);
    let report = pipeline.process("total revenue", false);

    assert_envelope_invariant(&report);
    assert!(!report.success);
    assert!(
        report
            .error
            .as_deref()
            .is_some_and(|m| m.contains("connection refused"))
    );
}

#[test]
fn blank_question_yields_failure_envelope() {
    let connection = empty_connection();
    let client = FixedCompletion("SELECT 1");
    let pipeline = NlQueryPipeline::new(&client, &connection);
    let report = pipeline.process("   ", false);

    assert_envelope_invariant(&report);
    assert!(!report.success);
}

/// Low but nonzero temperature means repeated questions may come back with
/// different SQL text; both completions must still be executable statements
/// over known tables, not byte-identical strings.
struct AlternatingCompletion(std::cell::Cell<usize>);

impl CompletionClient for AlternatingCompletion {
    fn complete(&self, _request: &CompletionRequest) -> Result<String, SynthesisError> {
        let call = self.0.get();
        self.0.set(call + 1);
        if call % 2 == 0 {
            Ok("SELECT region FROM sales GROUP BY region;".to_string())
        } else {
            Ok("select region\nfrom sales\ngroup by region;".to_string())
        }
    }
}

#[test]
fn repeated_questions_stay_semantically_stable() {
    let connection = seeded_connection();
    let client = AlternatingCompletion(std::cell::Cell::new(0));
    let pipeline = NlQueryPipeline::new(&client, &connection);

    let first = pipeline.process("sales by region", false);
    let second = pipeline.process("sales by region", false);

    for report in [&first, &second] {
        assert_envelope_invariant(report);
        assert!(report.success);
        assert!(report.query.to_lowercase().contains("sales"));
    }
    assert_ne!(first.query, second.query, "stylistic variation is expected");
    assert_eq!(first.rows, second.rows, "semantics must agree");
}

#[test]
fn explained_ask_carries_the_narrative() {
    let connection = seeded_connection();
    let pipeline = NlQueryPipeline::new(&ScriptedCompletion, &connection);
    let report = pipeline.process("how many sales?", true);

    assert_envelope_invariant(&report);
    assert!(report.success);
    assert_eq!(
        report.explanation.as_deref(),
        Some("- One aggregate row summarizing sale volume.")
    );
}

#[test]
fn explanation_failure_degrades_to_fallback_text() {
    let connection = seeded_connection();
    let pipeline = NlQueryPipeline::new(&ExplainRefusedCompletion, &connection);
    let report = pipeline.process("how many sales?", true);

    assert_envelope_invariant(&report);
    assert!(report.success, "explanation failure must not fail the query");
    assert_eq!(
        report.explanation.as_deref(),
        Some("Results retrieved successfully.")
    );
}

#[test]
fn unexplained_ask_omits_the_narrative() {
    let connection = seeded_connection();
    let pipeline = NlQueryPipeline::new(&ScriptedCompletion, &connection);
    let report = pipeline.process("how many sales?", false);

    assert!(report.success);
    assert!(report.explanation.is_none());
}

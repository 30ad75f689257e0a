use motordash::models::{QueryReport, ReportCommandFailure, json_schema};
use serde_json::json;

#[test]
fn success_report_serializes_required_top_level_fields() {
    let report = QueryReport::success(
        "SELECT region FROM sales",
        vec![json!({"region": "West"})],
        7,
    )
    .with_question("where do we sell?");

    let encoded = serde_json::to_value(&report).expect("report should serialize");
    let object = encoded.as_object().expect("report JSON should be object");
    assert_eq!(object.get("success"), Some(&json!(true)));
    assert_eq!(object.get("question"), Some(&json!("where do we sell?")));
    assert_eq!(object.get("query"), Some(&json!("SELECT region FROM sales")));
    assert_eq!(object.get("row_count"), Some(&json!(1)));
    assert_eq!(object.get("execution_time_ms"), Some(&json!(7)));
    assert!(object.contains_key("rows"));
    assert!(!object.contains_key("error"));
    assert!(!object.contains_key("explanation"));
}

#[test]
fn failure_report_serializes_error_and_empty_rows() {
    let report = QueryReport::failure("Could not generate SQL query: rate limited")
        .with_question("top sellers");

    let encoded = serde_json::to_value(&report).expect("report should serialize");
    assert_eq!(encoded.pointer("/success"), Some(&json!(false)));
    assert_eq!(encoded.pointer("/query"), Some(&json!("")));
    assert_eq!(encoded.pointer("/rows"), Some(&json!([])));
    assert_eq!(encoded.pointer("/execution_time_ms"), Some(&json!(0)));
    assert_eq!(
        encoded.pointer("/error"),
        Some(&json!("Could not generate SQL query: rate limited"))
    );
}

#[test]
fn truncation_marker_appears_only_when_set() {
    let plain = QueryReport::success("SELECT 1", vec![json!({"1": 1})], 0);
    let encoded = serde_json::to_value(&plain).expect("report should serialize");
    assert!(encoded.get("truncated").is_none());

    let capped = plain.with_truncated(true);
    let encoded = serde_json::to_value(&capped).expect("report should serialize");
    assert_eq!(encoded.get("truncated"), Some(&json!(true)));
}

#[test]
fn reports_round_trip_through_serde() {
    let report = QueryReport::success("SELECT 1", vec![json!({"1": 1})], 3)
        .with_question("one")
        .with_explanation("- It is one.");
    let encoded = serde_json::to_string(&report).expect("report should serialize");
    let decoded: QueryReport = serde_json::from_str(&encoded).expect("report should deserialize");
    assert_eq!(decoded, report);
}

#[test]
fn command_failure_renders_the_envelope_as_json() {
    let failure = ReportCommandFailure::new(
        QueryReport::failure("unable to open analytics store").with_query("SELECT 1"),
    );
    let parsed: serde_json::Value =
        serde_json::from_str(&failure.to_string()).expect("display output should be JSON");
    assert_eq!(parsed.pointer("/success"), Some(&json!(false)));
    assert_eq!(parsed.pointer("/query"), Some(&json!("SELECT 1")));
}

#[test]
fn generated_schema_marks_core_fields_required() {
    let schema = json_schema();
    let required = schema
        .pointer("/required")
        .and_then(|value| value.as_array())
        .expect("schema should list required fields");
    for field in ["success", "query", "rows", "row_count", "execution_time_ms"] {
        assert!(
            required.iter().any(|value| value == field),
            "field `{field}` should be required"
        );
    }
}

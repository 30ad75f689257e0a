use std::fmt::{Display, Formatter};
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::types::Value as SqlValue;
use serde::Serialize;
use rusqlite::{Connection, params, params_from_iter};
use serde_json::{Value, json};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub const SQLITE_SCHEMA_VERSION: &str = "motordash.v1.sqlite.v1";
pub const VEHICLES_TABLE: &str = "vehicles";
pub const INVENTORY_TABLE: &str = "inventory";
pub const SALES_TABLE: &str = "sales";
pub const SCHEMA_META_TABLE: &str = "motordash_schema_meta";

const CREATE_VEHICLES_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS vehicles (
    id INTEGER PRIMARY KEY,
    vin TEXT NOT NULL UNIQUE,
    make TEXT NOT NULL,
    model TEXT NOT NULL,
    year INTEGER NOT NULL,
    category TEXT NOT NULL,
    trim TEXT,
    msrp REAL NOT NULL,
    specifications TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    CHECK (category IN ('sedan', 'suv', 'truck', 'sports', 'offroad', 'compact')),
    CHECK (msrp >= 0)
);
"#;

const CREATE_INDEX_VEHICLES_MAKE_MODEL_SQL: &str = r#"
CREATE INDEX IF NOT EXISTS idx_vehicles_make_model
ON vehicles (make, model);
"#;

const CREATE_INDEX_VEHICLES_CATEGORY_YEAR_SQL: &str = r#"
CREATE INDEX IF NOT EXISTS idx_vehicles_category_year
ON vehicles (category, year);
"#;

const CREATE_INVENTORY_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS inventory (
    id INTEGER PRIMARY KEY,
    vehicle_id INTEGER NOT NULL REFERENCES vehicles(id),
    warehouse_location TEXT NOT NULL,
    region TEXT NOT NULL,
    quantity_available INTEGER NOT NULL DEFAULT 0,
    quantity_reserved INTEGER NOT NULL DEFAULT 0,
    reorder_point INTEGER NOT NULL DEFAULT 10,
    last_restocked TEXT,
    status TEXT NOT NULL DEFAULT 'active',
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    CHECK (quantity_available >= 0),
    CHECK (quantity_reserved >= 0),
    CHECK (status IN ('active', 'low', 'out_of_stock'))
);
"#;

const CREATE_INDEX_INVENTORY_VEHICLE_WAREHOUSE_SQL: &str = r#"
CREATE INDEX IF NOT EXISTS idx_inventory_vehicle_warehouse
ON inventory (vehicle_id, warehouse_location);
"#;

const CREATE_INDEX_INVENTORY_REGION_STATUS_SQL: &str = r#"
CREATE INDEX IF NOT EXISTS idx_inventory_region_status
ON inventory (region, status);
"#;

const CREATE_SALES_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS sales (
    id INTEGER PRIMARY KEY,
    vehicle_id INTEGER NOT NULL REFERENCES vehicles(id),
    sale_date TEXT NOT NULL,
    quantity INTEGER NOT NULL DEFAULT 1,
    unit_price REAL NOT NULL,
    total_amount REAL NOT NULL,
    customer_segment TEXT NOT NULL,
    region TEXT NOT NULL,
    salesperson_id TEXT,
    discount_applied REAL NOT NULL DEFAULT 0.0,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    CHECK (quantity > 0),
    CHECK (customer_segment IN ('individual', 'fleet', 'dealer'))
);
"#;

const CREATE_INDEX_SALES_DATE_REGION_SQL: &str = r#"
CREATE INDEX IF NOT EXISTS idx_sales_date_region
ON sales (sale_date, region);
"#;

const CREATE_INDEX_SALES_VEHICLE_DATE_SQL: &str = r#"
CREATE INDEX IF NOT EXISTS idx_sales_vehicle_date
ON sales (vehicle_id, sale_date);
"#;

const CREATE_INDEX_SALES_SEGMENT_DATE_SQL: &str = r#"
CREATE INDEX IF NOT EXISTS idx_sales_segment_date
ON sales (customer_segment, sale_date);
"#;

const CREATE_META_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS motordash_schema_meta (
    schema_version TEXT NOT NULL,
    applied_at_utc TEXT NOT NULL
);
"#;

#[must_use]
pub fn schema_statements() -> &'static [&'static str] {
    &[
        CREATE_VEHICLES_TABLE_SQL,
        CREATE_INDEX_VEHICLES_MAKE_MODEL_SQL,
        CREATE_INDEX_VEHICLES_CATEGORY_YEAR_SQL,
        CREATE_INVENTORY_TABLE_SQL,
        CREATE_INDEX_INVENTORY_VEHICLE_WAREHOUSE_SQL,
        CREATE_INDEX_INVENTORY_REGION_STATUS_SQL,
        CREATE_SALES_TABLE_SQL,
        CREATE_INDEX_SALES_DATE_REGION_SQL,
        CREATE_INDEX_SALES_VEHICLE_DATE_SQL,
        CREATE_INDEX_SALES_SEGMENT_DATE_SQL,
        CREATE_META_TABLE_SQL,
    ]
}

#[must_use]
pub fn create_schema_sql() -> String {
    schema_statements().join("\n")
}

pub fn open_connection(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| {
            format!(
                "failed to create sqlite parent directory: {}",
                parent.display()
            )
        })?;
    }

    Connection::open(path)
        .with_context(|| format!("failed to open sqlite database: {}", path.display()))
}

pub fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(&create_schema_sql())
        .context("failed to create sqlite schema")?;

    if schema_meta_has_version(connection, SQLITE_SCHEMA_VERSION)? {
        return Ok(());
    }

    let applied_at_utc = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .context("failed to format sqlite schema applied timestamp")?;
    connection
        .execute(
            &format!(
                "INSERT INTO {SCHEMA_META_TABLE} (schema_version, applied_at_utc) VALUES (?1, ?2)"
            ),
            params![SQLITE_SCHEMA_VERSION, applied_at_utc],
        )
        .context("failed to write sqlite schema meta row")?;

    Ok(())
}

fn schema_meta_has_version(connection: &Connection, schema_version: &str) -> Result<bool> {
    let query = format!(
        "SELECT EXISTS(SELECT 1 FROM {SCHEMA_META_TABLE} WHERE schema_version = ?1 LIMIT 1)"
    );
    let exists = connection
        .query_row(&query, [schema_version], |row| row.get::<usize, i64>(0))
        .context("failed to query sqlite schema version metadata")?;
    Ok(exists != 0)
}

/// Statement rejected or failed by the store. The NL boundary collapses this
/// into the report's single `error` string.
#[derive(Debug, Clone)]
pub struct ExecutionError {
    message: String,
}

impl ExecutionError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for ExecutionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ExecutionError {}

const MUTATING_KEYWORDS: &[&str] = &[
    "insert", "update", "delete", "create", "alter", "drop", "replace", "truncate", "exec",
    "execute", "attach", "detach", "pragma", "vacuum", "reindex", "begin", "commit", "rollback",
];

/// Accepts exactly one `SELECT` or `WITH ... SELECT` statement.
pub fn validate_read_only(raw_sql: &str) -> std::result::Result<(), ExecutionError> {
    let candidate = strip_trailing_semicolons(raw_sql);
    if candidate.is_empty() {
        return Err(ExecutionError::new("SQL statement is empty"));
    }

    if candidate.contains(';') {
        return Err(ExecutionError::new(
            "multi-statement SQL is not allowed; submit exactly one read-only statement",
        ));
    }

    let normalized = candidate.to_ascii_lowercase();
    if let Some(keyword) = first_mutating_keyword(&normalized) {
        return Err(ExecutionError::new(format!(
            "mutating SQL keyword `{keyword}` is not allowed; only SELECT queries are permitted"
        )));
    }

    if !(normalized.starts_with("select") || normalized.starts_with("with")) {
        return Err(ExecutionError::new(
            "only SELECT and WITH ... SELECT statements are allowed",
        ));
    }

    Ok(())
}

fn strip_trailing_semicolons(raw_sql: &str) -> &str {
    let mut candidate = raw_sql.trim();
    while let Some(stripped) = candidate.strip_suffix(';') {
        candidate = stripped.trim_end();
    }
    candidate
}

fn first_mutating_keyword(normalized_sql: &str) -> Option<String> {
    normalized_sql
        .split(|ch: char| !ch.is_ascii_alphanumeric() && ch != '_')
        .find_map(|token| {
            MUTATING_KEYWORDS
                .contains(&token)
                .then_some(token.to_string())
        })
}

#[derive(Debug)]
pub struct ExecutionOutcome {
    pub column_names: Vec<String>,
    pub rows: Vec<Value>,
    pub row_count: usize,
    pub truncated: bool,
}

/// Runs one statement and materializes every row as a JSON object keyed by
/// column name, in result order. `row_cap` of `None` streams to completion;
/// `Some(n)` stops after `n` rows and marks the outcome truncated.
pub fn execute_read_only(
    connection: &Connection,
    sql: &str,
    params: &[SqlValue],
    row_cap: Option<usize>,
) -> std::result::Result<ExecutionOutcome, ExecutionError> {
    let mut statement = connection
        .prepare(sql)
        .map_err(|error| ExecutionError::new(format!("failed to prepare query: {error}")))?;
    let column_names = statement
        .column_names()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>();

    let mut rows = statement
        .query(params_from_iter(params.iter()))
        .map_err(|error| ExecutionError::new(format!("failed to execute query: {error}")))?;
    let mut result_rows = Vec::new();
    let mut truncated = false;
    while let Some(row) = rows
        .next()
        .map_err(|error| ExecutionError::new(format!("failed to fetch query row: {error}")))?
    {
        if let Some(cap) = row_cap
            && result_rows.len() >= cap
        {
            truncated = true;
            break;
        }

        let mut record = serde_json::Map::new();
        for (index, column_name) in column_names.iter().enumerate() {
            let value = row.get::<usize, SqlValue>(index).map_err(|error| {
                ExecutionError::new(format!("failed to decode query column: {error}"))
            })?;
            record.insert(column_name.clone(), json_value_from_sql(value));
        }
        result_rows.push(Value::Object(record));
    }

    Ok(ExecutionOutcome {
        column_names,
        row_count: result_rows.len(),
        rows: result_rows,
        truncated,
    })
}

pub fn parse_query_params(params_json: Option<&str>) -> Result<Vec<SqlValue>> {
    let Some(raw) = params_json else {
        return Ok(Vec::new());
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let parsed =
        serde_json::from_str::<Value>(trimmed).context("params must be valid JSON if provided")?;
    match parsed {
        Value::Null => Ok(Vec::new()),
        Value::Array(values) => values
            .into_iter()
            .map(sql_value_from_json)
            .collect::<Result<Vec<_>>>(),
        value => Ok(vec![sql_value_from_json(value)?]),
    }
}

fn sql_value_from_json(value: Value) -> Result<SqlValue> {
    match value {
        Value::Null => Ok(SqlValue::Null),
        Value::Bool(flag) => Ok(SqlValue::Integer(i64::from(flag))),
        Value::Number(number) => {
            if let Some(integer) = number.as_i64() {
                Ok(SqlValue::Integer(integer))
            } else if let Some(unsigned) = number.as_u64() {
                i64::try_from(unsigned)
                    .map(SqlValue::Integer)
                    .map_err(|_| anyhow::anyhow!("params integer exceeds sqlite INTEGER range"))
            } else if let Some(real) = number.as_f64() {
                Ok(SqlValue::Real(real))
            } else {
                Err(anyhow::anyhow!("unsupported numeric param value"))
            }
        }
        Value::String(text) => Ok(SqlValue::Text(text)),
        Value::Array(_) | Value::Object(_) => {
            Err(anyhow::anyhow!("params entries must be scalar JSON values"))
        }
    }
}

fn json_value_from_sql(value: SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(value) => json!(value),
        SqlValue::Real(value) => json!(value),
        SqlValue::Text(value) => json!(value),
        SqlValue::Blob(value) => json!(encode_blob_hex(&value)),
    }
}

fn encode_blob_hex(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut output = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        output.push(HEX[(byte >> 4) as usize] as char);
        output.push(HEX[(byte & 0x0f) as usize] as char);
    }
    output
}

#[derive(Debug, Clone, Serialize)]
pub struct SchemaColumnRow {
    pub table: String,
    pub kind: String,
    pub column: String,
    pub declared_type: Option<String>,
    pub nullable: bool,
    pub primary_key: bool,
}

/// Live introspection of the store, one row per column of every table/view.
pub fn describe_schema(
    connection: &Connection,
    include_internal: bool,
) -> Result<Vec<SchemaColumnRow>> {
    let mut statement = connection
        .prepare(
            "SELECT name, type
             FROM sqlite_schema
             WHERE type IN ('table', 'view')
             ORDER BY CASE type WHEN 'table' THEN 0 ELSE 1 END, name ASC",
        )
        .context("failed to prepare sqlite_schema introspection query")?;

    let object_rows = statement
        .query_map([], |row| {
            Ok((row.get::<usize, String>(0)?, row.get::<usize, String>(1)?))
        })
        .context("failed to execute sqlite_schema introspection query")?;

    let mut objects = Vec::new();
    for row in object_rows {
        let (name, kind) = row.context("failed to decode sqlite_schema row")?;
        if !include_internal && is_internal_schema_object(&name) {
            continue;
        }
        objects.push((name, kind));
    }

    let mut columns = Vec::new();
    for (name, kind) in objects {
        let pragma_sql = format!("PRAGMA table_info({})", sqlite_single_quoted(&name));
        let mut pragma = connection
            .prepare(&pragma_sql)
            .with_context(|| format!("failed to prepare column introspection for `{name}`"))?;
        let column_rows = pragma
            .query_map([], |row| {
                Ok(SchemaColumnRow {
                    table: name.clone(),
                    kind: kind.clone(),
                    column: row.get::<usize, String>(1)?,
                    declared_type: row.get::<usize, Option<String>>(2)?,
                    nullable: row.get::<usize, i64>(3)? == 0,
                    primary_key: row.get::<usize, i64>(5)? > 0,
                })
            })
            .with_context(|| format!("failed to execute column introspection for `{name}`"))?;
        for column in column_rows {
            columns.push(column.context("failed to decode schema column row")?);
        }
    }

    Ok(columns)
}

fn is_internal_schema_object(object_name: &str) -> bool {
    object_name.starts_with("sqlite_") || object_name == SCHEMA_META_TABLE
}

fn sqlite_single_quoted(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

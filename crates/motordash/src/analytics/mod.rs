//! KPI aggregation contract over the sales/inventory store. Each report is a
//! fixed statement run through the shared read-only executor; the SQL that
//! produced the rows travels in the report's `query` field.

use std::time::Instant;

use rusqlite::Connection;
use rusqlite::types::Value as SqlValue;

use crate::db::{self, ExecutionError};
use crate::models::QueryReport;

const SALES_SUMMARY_SQL: &str = r#"
SELECT
    ROUND(COALESCE(SUM(total_amount), 0.0), 2) AS total_revenue,
    COALESCE(SUM(quantity), 0) AS total_units,
    COUNT(*) AS transaction_count,
    CASE
        WHEN COALESCE(SUM(quantity), 0) = 0 THEN 0.0
        ELSE ROUND(SUM(total_amount) / SUM(quantity), 2)
    END AS avg_unit_revenue
FROM sales
WHERE (?1 IS NULL OR sale_date >= ?1)
  AND (?2 IS NULL OR sale_date <= ?2)
"#;

const TOP_SELLING_VEHICLES_SQL: &str = r#"
SELECT
    sales.vehicle_id,
    vehicles.make,
    vehicles.model,
    vehicles.category,
    SUM(sales.quantity) AS total_quantity,
    ROUND(SUM(sales.total_amount), 2) AS total_revenue
FROM sales
JOIN vehicles ON vehicles.id = sales.vehicle_id
WHERE (?1 IS NULL OR sales.sale_date >= ?1)
  AND (?2 IS NULL OR sales.sale_date <= ?2)
GROUP BY sales.vehicle_id, vehicles.make, vehicles.model, vehicles.category
ORDER BY total_quantity DESC, total_revenue DESC, sales.vehicle_id ASC
LIMIT ?3
"#;

const SALES_BY_REGION_SQL: &str = r#"
SELECT
    region,
    SUM(quantity) AS total_quantity,
    ROUND(SUM(total_amount), 2) AS total_revenue,
    COUNT(*) AS transaction_count
FROM sales
WHERE (?1 IS NULL OR sale_date >= ?1)
  AND (?2 IS NULL OR sale_date <= ?2)
GROUP BY region
ORDER BY total_revenue DESC, region ASC
"#;

const SALES_BY_SEGMENT_SQL: &str = r#"
SELECT
    customer_segment,
    SUM(quantity) AS total_quantity,
    ROUND(SUM(total_amount), 2) AS total_revenue,
    COUNT(*) AS transaction_count
FROM sales
WHERE (?1 IS NULL OR sale_date >= ?1)
  AND (?2 IS NULL OR sale_date <= ?2)
GROUP BY customer_segment
ORDER BY total_revenue DESC, customer_segment ASC
"#;

const MONTHLY_SALES_TREND_SQL: &str = r#"
SELECT
    CAST(strftime('%m', sale_date) AS INTEGER) AS month,
    SUM(quantity) AS total_quantity,
    ROUND(SUM(total_amount), 2) AS total_revenue
FROM sales
WHERE strftime('%Y', sale_date) = ?1
GROUP BY month
ORDER BY month ASC
"#;

const INVENTORY_STATUS_SQL: &str = r#"
SELECT
    vehicles.make,
    vehicles.model,
    inventory.warehouse_location,
    inventory.region,
    inventory.quantity_available,
    inventory.quantity_reserved,
    inventory.reorder_point,
    inventory.status
FROM inventory
JOIN vehicles ON vehicles.id = inventory.vehicle_id
WHERE inventory.status != 'active'
   OR inventory.quantity_available < inventory.reorder_point
ORDER BY inventory.quantity_available ASC, vehicles.make ASC, vehicles.model ASC
"#;

/// Optional inclusive sale-date window, ISO `YYYY-MM-DD` bounds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl DateRange {
    fn params(&self) -> Vec<SqlValue> {
        vec![
            text_or_null(self.start.as_deref()),
            text_or_null(self.end.as_deref()),
        ]
    }
}

fn text_or_null(value: Option<&str>) -> SqlValue {
    value.map_or(SqlValue::Null, |text| SqlValue::Text(text.to_string()))
}

#[derive(Debug, Clone)]
pub struct AnalyticsQuery {
    pub name: &'static str,
    pub sql: &'static str,
    params: Vec<SqlValue>,
}

#[must_use]
pub fn sales_summary(range: &DateRange) -> AnalyticsQuery {
    AnalyticsQuery {
        name: "sales_summary",
        sql: SALES_SUMMARY_SQL,
        params: range.params(),
    }
}

#[must_use]
pub fn top_selling_vehicles(limit: usize, range: &DateRange) -> AnalyticsQuery {
    let mut params = range.params();
    params.push(SqlValue::Integer(limit.max(1) as i64));
    AnalyticsQuery {
        name: "top_selling_vehicles",
        sql: TOP_SELLING_VEHICLES_SQL,
        params,
    }
}

#[must_use]
pub fn sales_by_region(range: &DateRange) -> AnalyticsQuery {
    AnalyticsQuery {
        name: "sales_by_region",
        sql: SALES_BY_REGION_SQL,
        params: range.params(),
    }
}

#[must_use]
pub fn sales_by_customer_segment(range: &DateRange) -> AnalyticsQuery {
    AnalyticsQuery {
        name: "sales_by_customer_segment",
        sql: SALES_BY_SEGMENT_SQL,
        params: range.params(),
    }
}

#[must_use]
pub fn monthly_sales_trend(year: i32) -> AnalyticsQuery {
    AnalyticsQuery {
        name: "monthly_sales_trend",
        sql: MONTHLY_SALES_TREND_SQL,
        params: vec![SqlValue::Text(format!("{year:04}"))],
    }
}

#[must_use]
pub fn inventory_status() -> AnalyticsQuery {
    AnalyticsQuery {
        name: "inventory_status",
        sql: INVENTORY_STATUS_SQL,
        params: Vec::new(),
    }
}

pub fn run(
    connection: &Connection,
    query: &AnalyticsQuery,
) -> Result<QueryReport, ExecutionError> {
    let started = Instant::now();
    let outcome = db::execute_read_only(connection, query.sql, &query.params, None)?;
    let execution_time_ms = started.elapsed().as_millis() as u64;
    Ok(QueryReport::success(
        query.sql.trim(),
        outcome.rows,
        execution_time_ms,
    ))
}

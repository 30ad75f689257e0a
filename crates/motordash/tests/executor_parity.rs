use motordash::db::execute_read_only;
use motordash::seed::{SeedPlan, seed_database};
use rusqlite::Connection;
use time::{Date, Month};

fn seeded_connection() -> Connection {
    let mut connection = Connection::open_in_memory().expect("in-memory sqlite should open");
    let plan = SeedPlan {
        vehicles: 18,
        days: 45,
        as_of: Date::from_calendar_date(2026, Month::March, 15).expect("fixture date is valid"),
    };
    seed_database(&mut connection, &plan).expect("seeding should succeed");
    connection
}

/// The executor must hand back exactly what the store returned: same rows,
/// same order, same values, no transformation or filtering.
#[test]
fn executor_rows_match_direct_execution() {
    let connection = seeded_connection();
    let sql = "SELECT vin, make, model, msrp FROM vehicles ORDER BY id";

    let mut statement = connection.prepare(sql).expect("statement should prepare");
    let direct_rows = statement
        .query_map([], |row| {
            Ok((
                row.get::<usize, String>(0)?,
                row.get::<usize, String>(1)?,
                row.get::<usize, String>(2)?,
                row.get::<usize, f64>(3)?,
            ))
        })
        .expect("direct query should run")
        .collect::<Result<Vec<_>, _>>()
        .expect("direct rows should decode");
    assert!(!direct_rows.is_empty());

    let outcome =
        execute_read_only(&connection, sql, &[], None).expect("executor query should run");
    assert_eq!(outcome.row_count, direct_rows.len());
    assert_eq!(outcome.column_names, vec!["vin", "make", "model", "msrp"]);

    for (row, (vin, make, model, msrp)) in outcome.rows.iter().zip(&direct_rows) {
        assert_eq!(row.pointer("/vin").and_then(|v| v.as_str()), Some(vin.as_str()));
        assert_eq!(row.pointer("/make").and_then(|v| v.as_str()), Some(make.as_str()));
        assert_eq!(
            row.pointer("/model").and_then(|v| v.as_str()),
            Some(model.as_str())
        );
        let executor_msrp = row
            .pointer("/msrp")
            .and_then(|v| v.as_f64())
            .expect("msrp should decode as number");
        assert!((executor_msrp - msrp).abs() < f64::EPSILON);
    }
}

#[test]
fn executor_preserves_store_ordering_for_aggregates() {
    let connection = seeded_connection();
    let sql = "SELECT region, SUM(total_amount) AS revenue \
               FROM sales GROUP BY region ORDER BY revenue DESC, region ASC";

    let mut statement = connection.prepare(sql).expect("statement should prepare");
    let direct_regions = statement
        .query_map([], |row| row.get::<usize, String>(0))
        .expect("direct query should run")
        .collect::<Result<Vec<_>, _>>()
        .expect("direct rows should decode");

    let outcome =
        execute_read_only(&connection, sql, &[], None).expect("executor query should run");
    let executor_regions = outcome
        .rows
        .iter()
        .map(|row| {
            row.pointer("/region")
                .and_then(|v| v.as_str())
                .expect("region column should decode")
                .to_string()
        })
        .collect::<Vec<_>>();

    assert_eq!(executor_regions, direct_regions);
}

#[test]
fn null_columns_survive_materialization() {
    let connection = Connection::open_in_memory().expect("in-memory sqlite should open");
    connection
        .execute_batch(
            "CREATE TABLE t (a INTEGER, b TEXT);
             INSERT INTO t VALUES (1, NULL), (NULL, 'x');",
        )
        .expect("fixture table should build");

    let outcome = execute_read_only(&connection, "SELECT a, b FROM t ORDER BY rowid", &[], None)
        .expect("query should run");
    assert_eq!(outcome.row_count, 2);
    assert!(outcome.rows[0].pointer("/b").expect("b present").is_null());
    assert!(outcome.rows[1].pointer("/a").expect("a present").is_null());
}

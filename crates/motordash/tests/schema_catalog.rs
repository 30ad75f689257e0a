//! The static catalog the language model sees and the live SQLite DDL must
//! describe the same schema; a drift here silently degrades every synthesis.

use std::collections::BTreeSet;

use motordash::catalog;
use motordash::db;
use rusqlite::Connection;

fn live_columns(connection: &Connection, table: &str) -> BTreeSet<String> {
    let mut statement = connection
        .prepare(&format!("PRAGMA table_info('{table}')"))
        .expect("pragma should prepare");
    statement
        .query_map([], |row| row.get::<usize, String>(1))
        .expect("pragma should run")
        .collect::<Result<BTreeSet<_>, _>>()
        .expect("pragma rows should decode")
}

#[test]
fn every_catalog_table_and_column_exists_in_the_store() {
    let connection = Connection::open_in_memory().expect("in-memory sqlite should open");
    db::ensure_schema(&connection).expect("schema creation should succeed");

    for table in catalog::TABLES {
        let columns = live_columns(&connection, table.name);
        assert!(
            !columns.is_empty(),
            "catalog table `{}` is missing from the store",
            table.name
        );
        for column in table.columns {
            assert!(
                columns.contains(column.name),
                "catalog column `{}.{}` is missing from the store",
                table.name,
                column.name
            );
        }
    }
}

#[test]
fn catalog_vocabularies_match_the_check_constraints() {
    let ddl = db::create_schema_sql();
    for category in catalog::CATEGORIES {
        assert!(
            ddl.contains(&format!("'{category}'")),
            "category `{category}` missing from DDL CHECK"
        );
    }
    for segment in catalog::CUSTOMER_SEGMENTS {
        assert!(
            ddl.contains(&format!("'{segment}'")),
            "segment `{segment}` missing from DDL CHECK"
        );
    }
    for status in catalog::INVENTORY_STATUSES {
        assert!(
            ddl.contains(&format!("'{status}'")),
            "status `{status}` missing from DDL CHECK"
        );
    }
}

#[test]
fn few_shot_examples_execute_against_the_live_schema() {
    let connection = Connection::open_in_memory().expect("in-memory sqlite should open");
    db::ensure_schema(&connection).expect("schema creation should succeed");

    for example in catalog::FEW_SHOT_EXAMPLES {
        db::validate_read_only(example.sql).unwrap_or_else(|violation| {
            panic!("example `{}` rejected: {violation}", example.question)
        });
        db::execute_read_only(&connection, example.sql, &[], None).unwrap_or_else(|error| {
            panic!("example `{}` failed to execute: {error}", example.question)
        });
    }
}

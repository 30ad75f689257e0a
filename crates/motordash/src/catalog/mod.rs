//! Static description of the queryable schema handed to the language model
//! as grounding context. The SQLite DDL in `crate::db` must stay in lockstep
//! with these descriptors; `tests/schema_catalog.rs` pins that.

use serde::Serialize;

#[derive(Debug, Clone, Copy)]
pub struct ColumnDescriptor {
    pub name: &'static str,
    pub role: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct TableDescriptor {
    pub name: &'static str,
    pub columns: &'static [ColumnDescriptor],
}

pub const VEHICLES: TableDescriptor = TableDescriptor {
    name: "vehicles",
    columns: &[
        ColumnDescriptor { name: "id", role: "identifier" },
        ColumnDescriptor { name: "vin", role: "identifier" },
        ColumnDescriptor { name: "make", role: "dimension" },
        ColumnDescriptor { name: "model", role: "dimension" },
        ColumnDescriptor { name: "year", role: "dimension" },
        ColumnDescriptor { name: "category", role: "dimension" },
        ColumnDescriptor { name: "trim", role: "dimension" },
        ColumnDescriptor { name: "msrp", role: "measure" },
    ],
};

pub const INVENTORY: TableDescriptor = TableDescriptor {
    name: "inventory",
    columns: &[
        ColumnDescriptor { name: "id", role: "identifier" },
        ColumnDescriptor { name: "vehicle_id", role: "foreign_key" },
        ColumnDescriptor { name: "warehouse_location", role: "dimension" },
        ColumnDescriptor { name: "region", role: "dimension" },
        ColumnDescriptor { name: "quantity_available", role: "measure" },
        ColumnDescriptor { name: "quantity_reserved", role: "measure" },
        ColumnDescriptor { name: "reorder_point", role: "measure" },
        ColumnDescriptor { name: "last_restocked", role: "timestamp" },
        ColumnDescriptor { name: "status", role: "dimension" },
    ],
};

pub const SALES: TableDescriptor = TableDescriptor {
    name: "sales",
    columns: &[
        ColumnDescriptor { name: "id", role: "identifier" },
        ColumnDescriptor { name: "vehicle_id", role: "foreign_key" },
        ColumnDescriptor { name: "sale_date", role: "timestamp" },
        ColumnDescriptor { name: "quantity", role: "measure" },
        ColumnDescriptor { name: "unit_price", role: "measure" },
        ColumnDescriptor { name: "total_amount", role: "measure" },
        ColumnDescriptor { name: "customer_segment", role: "dimension" },
        ColumnDescriptor { name: "region", role: "dimension" },
        ColumnDescriptor { name: "salesperson_id", role: "dimension" },
        ColumnDescriptor { name: "discount_applied", role: "measure" },
    ],
};

pub const TABLES: &[TableDescriptor] = &[VEHICLES, INVENTORY, SALES];

pub const CATEGORIES: &[&str] = &["sedan", "suv", "truck", "sports", "offroad", "compact"];
pub const REGIONS: &[&str] = &["West", "Midwest", "South", "Northeast", "Southeast"];
pub const CUSTOMER_SEGMENTS: &[&str] = &["individual", "fleet", "dealer"];
pub const INVENTORY_STATUSES: &[&str] = &["active", "low", "out_of_stock"];

#[derive(Debug, Clone, Copy)]
pub struct FewShotExample {
    pub question: &'static str,
    pub sql: &'static str,
}

pub const FEW_SHOT_EXAMPLES: &[FewShotExample] = &[
    FewShotExample {
        question: "What are the top 5 vehicles by units sold?",
        sql: "SELECT vehicles.make, vehicles.model, SUM(sales.quantity) AS total_quantity \
              FROM sales JOIN vehicles ON vehicles.id = sales.vehicle_id \
              GROUP BY sales.vehicle_id ORDER BY total_quantity DESC LIMIT 5;",
    },
    FewShotExample {
        question: "What is the total revenue by region?",
        sql: "SELECT region, SUM(total_amount) AS total_revenue \
              FROM sales GROUP BY region ORDER BY total_revenue DESC;",
    },
    FewShotExample {
        question: "Which warehouses are low on stock?",
        sql: "SELECT warehouse_location, quantity_available, reorder_point \
              FROM inventory WHERE status = 'low' \
              ORDER BY quantity_available ASC;",
    },
];

/// Fixed textual grounding block embedded in the synthesis system prompt.
/// Same output for every call; no inputs, no failure modes.
#[must_use]
pub fn schema_context() -> String {
    let mut context = String::from("Tables:\n");
    for table in TABLES {
        let columns = table
            .columns
            .iter()
            .map(|column| column.name)
            .collect::<Vec<_>>()
            .join(", ");
        context.push_str(&format!("- {}: {columns}\n", table.name));
    }
    context.push_str(&format!("\nCategories include: {}\n", CATEGORIES.join(", ")));
    context.push_str(&format!("Regions include: {}\n", REGIONS.join(", ")));
    context.push_str(&format!(
        "Customer segments: {}\n",
        CUSTOMER_SEGMENTS.join(", ")
    ));
    context.push_str(&format!(
        "Inventory statuses: {}\n",
        INVENTORY_STATUSES.join(", ")
    ));
    context
}

/// One row per column, for the `query catalog` envelope.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogRow {
    pub table: &'static str,
    pub column: &'static str,
    pub role: &'static str,
}

#[must_use]
pub fn catalog_rows() -> Vec<CatalogRow> {
    TABLES
        .iter()
        .flat_map(|table| {
            table.columns.iter().map(|column| CatalogRow {
                table: table.name,
                column: column.name,
                role: column.role,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{CATEGORIES, FEW_SHOT_EXAMPLES, TABLES, catalog_rows, schema_context};

    #[test]
    fn schema_context_names_every_table_and_column() {
        let context = schema_context();
        for table in TABLES {
            assert!(context.contains(table.name), "missing table {}", table.name);
            for column in table.columns {
                assert!(
                    context.contains(column.name),
                    "missing column {}.{}",
                    table.name,
                    column.name
                );
            }
        }
        for category in CATEGORIES {
            assert!(context.contains(category));
        }
    }

    #[test]
    fn few_shot_examples_reference_known_tables() {
        for example in FEW_SHOT_EXAMPLES {
            let references_known_table = TABLES
                .iter()
                .any(|table| example.sql.contains(table.name));
            assert!(
                references_known_table,
                "example `{}` references no catalog table",
                example.question
            );
            assert!(example.sql.trim_start().to_uppercase().starts_with("SELECT"));
        }
    }

    #[test]
    fn catalog_rows_cover_all_columns() {
        let rows = catalog_rows();
        let expected: usize = TABLES.iter().map(|table| table.columns.len()).sum();
        assert_eq!(rows.len(), expected);
    }
}

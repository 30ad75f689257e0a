//! Deterministic synthetic data for the sales/inventory store. Values derive
//! from index arithmetic rather than a PRNG so tests can predict exact
//! totals; the same plan always produces byte-identical rows.

use anyhow::{Context, Result};
use rusqlite::{Connection, params};
use serde::Serialize;
use time::{Date, Duration};

use crate::catalog;
use crate::db;
use crate::utils::time::format_iso_date;

const MODEL_CATALOG: &[(&str, &str, &str)] = &[
    ("Toyota", "Camry", "sedan"),
    ("Toyota", "Corolla", "sedan"),
    ("Toyota", "RAV4", "suv"),
    ("Toyota", "Tacoma", "truck"),
    ("Toyota", "4Runner", "offroad"),
    ("Honda", "Civic", "sedan"),
    ("Honda", "CR-V", "suv"),
    ("Honda", "Ridgeline", "truck"),
    ("Ford", "F-150", "truck"),
    ("Ford", "Mustang", "sports"),
    ("Ford", "Explorer", "suv"),
    ("Ford", "Bronco", "offroad"),
    ("Chevrolet", "Silverado", "truck"),
    ("Chevrolet", "Equinox", "suv"),
    ("Chevrolet", "Malibu", "sedan"),
    ("Jeep", "Wrangler", "offroad"),
    ("Jeep", "Grand Cherokee", "suv"),
    ("Jeep", "Compass", "compact"),
    ("BMW", "3 Series", "sedan"),
    ("BMW", "X5", "suv"),
    ("Hyundai", "Elantra", "sedan"),
    ("Hyundai", "Tucson", "suv"),
    ("Hyundai", "Kona", "compact"),
];

const TRIM_LEVELS: &[&str] = &[
    "Base", "LE", "XLE", "Limited", "Sport", "Touring", "Premium",
];

const WAREHOUSES: &[(&str, &str)] = &[
    ("Los Angeles Warehouse", "West"),
    ("San Francisco Warehouse", "West"),
    ("Chicago Warehouse", "Midwest"),
    ("Detroit Warehouse", "Midwest"),
    ("Houston Warehouse", "South"),
    ("Dallas Warehouse", "South"),
    ("New York Warehouse", "Northeast"),
    ("Boston Warehouse", "Northeast"),
    ("Atlanta Warehouse", "Southeast"),
    ("Miami Warehouse", "Southeast"),
];

const ENGINES: &[&str] = &["2.0L I4", "2.5L I4", "3.5L V6", "5.0L V8", "Hybrid", "Electric"];
const TRANSMISSIONS: &[&str] = &["Automatic", "Manual", "CVT"];
const DRIVETRAINS: &[&str] = &["FWD", "RWD", "AWD", "4WD"];

fn msrp_band(category: &str) -> (f64, f64) {
    match category {
        "suv" => (28_000.0, 75_000.0),
        "truck" => (30_000.0, 70_000.0),
        "sports" => (28_000.0, 65_000.0),
        "offroad" => (35_000.0, 60_000.0),
        "compact" => (20_000.0, 35_000.0),
        _ => (22_000.0, 55_000.0),
    }
}

fn sales_per_day(month: u8) -> usize {
    match month {
        1 | 2 => 2,
        6 | 7 | 12 => 4,
        _ => 3,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedPlan {
    pub vehicles: usize,
    pub days: u32,
    pub as_of: Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeedStats {
    pub vehicles: usize,
    pub inventory_rows: usize,
    pub sales: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VehicleSeed {
    pub vin: String,
    pub make: &'static str,
    pub model: &'static str,
    pub year: i32,
    pub category: &'static str,
    pub trim: &'static str,
    pub msrp: f64,
    pub specifications: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InventorySeed {
    pub vehicle_index: usize,
    pub warehouse_location: &'static str,
    pub region: &'static str,
    pub quantity_available: i64,
    pub quantity_reserved: i64,
    pub reorder_point: i64,
    pub last_restocked: String,
    pub status: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SaleSeed {
    pub vehicle_index: usize,
    pub sale_date: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub total_amount: f64,
    pub customer_segment: &'static str,
    pub region: &'static str,
    pub salesperson_id: String,
    pub discount_applied: f64,
}

#[must_use]
pub fn build_vehicles(count: usize) -> Vec<VehicleSeed> {
    (0..count)
        .map(|index| {
            let (make, model, category) = MODEL_CATALOG[index % MODEL_CATALOG.len()];
            let (low, high) = msrp_band(category);
            let fraction = ((index * 37) % 101) as f64 / 100.0;
            let specifications = serde_json::json!({
                "engine": ENGINES[index % ENGINES.len()],
                "transmission": TRANSMISSIONS[index % TRANSMISSIONS.len()],
                "drivetrain": DRIVETRAINS[index % DRIVETRAINS.len()],
            });

            VehicleSeed {
                vin: format!("MD{:015}", index + 1),
                make,
                model,
                year: 2020 + (index % 5) as i32,
                category,
                trim: TRIM_LEVELS[index % TRIM_LEVELS.len()],
                msrp: round2(low + fraction * (high - low)),
                specifications: specifications.to_string(),
            }
        })
        .collect()
}

#[must_use]
pub fn build_inventory(vehicles: &[VehicleSeed], as_of: Date) -> Vec<InventorySeed> {
    let mut records = Vec::new();
    for (index, _vehicle) in vehicles.iter().enumerate() {
        let warehouse_count = 2 + index % 3;
        for slot in 0..warehouse_count {
            let (warehouse_location, region) = WAREHOUSES[(index + slot * 3) % WAREHOUSES.len()];
            let mut quantity_available = (5 + (index * 7 + slot * 11) % 46) as i64;
            if (index + slot) % 13 == 0 {
                quantity_available = 0;
            }
            let reorder_point = (5 + (index + 2 * slot) % 11) as i64;
            let status = if quantity_available == 0 {
                "out_of_stock"
            } else if quantity_available < reorder_point {
                "low"
            } else {
                "active"
            };
            let reserve_ceiling = (quantity_available / 2).min(5);
            let quantity_reserved = ((index + slot) as i64) % (reserve_ceiling + 1);
            let last_restocked =
                format_iso_date(as_of - Duration::days(((index + slot) % 90 + 1) as i64));

            records.push(InventorySeed {
                vehicle_index: index,
                warehouse_location,
                region,
                quantity_available,
                quantity_reserved,
                reorder_point,
                last_restocked,
                status,
            });
        }
    }
    records
}

#[must_use]
pub fn build_sales(vehicles: &[VehicleSeed], plan: &SeedPlan) -> Vec<SaleSeed> {
    let mut records = Vec::new();
    if vehicles.is_empty() {
        return records;
    }

    for day_offset in 0..plan.days as usize {
        let sale_date = plan.as_of - Duration::days((plan.days as usize - 1 - day_offset) as i64);
        let month = u8::from(sale_date.month());
        for slot in 0..sales_per_day(month) {
            let vehicle_index = (day_offset * 5 + slot * 17) % vehicles.len();
            let vehicle = &vehicles[vehicle_index];

            let segment_pick = (day_offset + slot * 3) % 10;
            let (customer_segment, quantity, discount_applied) = if segment_pick < 7 {
                let discount = if (day_offset + slot) % 3 == 0 { 2.0 } else { 0.0 };
                ("individual", 1, discount)
            } else if segment_pick < 9 {
                ("fleet", (2 + (day_offset + slot) % 4) as i64, 5.0)
            } else {
                ("dealer", (4 + (day_offset + 2 * slot) % 5) as i64, 8.0)
            };

            let unit_price = round2(vehicle.msrp * (1.0 - discount_applied / 100.0));
            records.push(SaleSeed {
                vehicle_index,
                sale_date: format_iso_date(sale_date),
                quantity,
                unit_price,
                total_amount: round2(unit_price * quantity as f64),
                customer_segment,
                region: catalog::REGIONS[(vehicle_index + day_offset) % catalog::REGIONS.len()],
                salesperson_id: format!("sp-{:03}", (day_offset * 7 + slot) % 25 + 1),
                discount_applied,
            });
        }
    }
    records
}

/// Rebuilds the store content from the plan: schema ensured, previous rows
/// cleared, generated rows inserted in one transaction.
pub fn seed_database(connection: &mut Connection, plan: &SeedPlan) -> Result<SeedStats> {
    db::ensure_schema(connection)?;

    let vehicles = build_vehicles(plan.vehicles);
    let inventory = build_inventory(&vehicles, plan.as_of);
    let sales = build_sales(&vehicles, plan);

    let tx = connection
        .transaction()
        .context("failed to open seed transaction")?;
    tx.execute_batch("DELETE FROM sales; DELETE FROM inventory; DELETE FROM vehicles;")
        .context("failed to clear existing rows before seeding")?;

    let mut vehicle_ids = Vec::with_capacity(vehicles.len());
    {
        let mut insert_vehicle = tx
            .prepare_cached(
                "INSERT INTO vehicles (vin, make, model, year, category, trim, msrp, specifications)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )
            .context("failed to prepare vehicle insert")?;
        for vehicle in &vehicles {
            insert_vehicle
                .execute(params![
                    vehicle.vin,
                    vehicle.make,
                    vehicle.model,
                    vehicle.year,
                    vehicle.category,
                    vehicle.trim,
                    vehicle.msrp,
                    vehicle.specifications,
                ])
                .with_context(|| format!("failed to insert vehicle vin={}", vehicle.vin))?;
            vehicle_ids.push(tx.last_insert_rowid());
        }

        let mut insert_inventory = tx
            .prepare_cached(
                "INSERT INTO inventory (vehicle_id, warehouse_location, region,
                     quantity_available, quantity_reserved, reorder_point, last_restocked, status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )
            .context("failed to prepare inventory insert")?;
        for record in &inventory {
            insert_inventory
                .execute(params![
                    vehicle_ids[record.vehicle_index],
                    record.warehouse_location,
                    record.region,
                    record.quantity_available,
                    record.quantity_reserved,
                    record.reorder_point,
                    record.last_restocked,
                    record.status,
                ])
                .with_context(|| {
                    format!(
                        "failed to insert inventory row for {}",
                        record.warehouse_location
                    )
                })?;
        }

        let mut insert_sale = tx
            .prepare_cached(
                "INSERT INTO sales (vehicle_id, sale_date, quantity, unit_price, total_amount,
                     customer_segment, region, salesperson_id, discount_applied)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )
            .context("failed to prepare sales insert")?;
        for record in &sales {
            insert_sale
                .execute(params![
                    vehicle_ids[record.vehicle_index],
                    record.sale_date,
                    record.quantity,
                    record.unit_price,
                    record.total_amount,
                    record.customer_segment,
                    record.region,
                    record.salesperson_id,
                    record.discount_applied,
                ])
                .with_context(|| format!("failed to insert sale on {}", record.sale_date))?;
        }
    }
    tx.commit().context("failed to commit seed transaction")?;

    Ok(SeedStats {
        vehicles: vehicles.len(),
        inventory_rows: inventory.len(),
        sales: sales.len(),
    })
}

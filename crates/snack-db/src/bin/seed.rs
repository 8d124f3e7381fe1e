//! # Seed Data Generator
//!
//! Populates a database with a small demo stand: a handful of snacks, a few
//! regulars, and a week of paid and unpaid sales.
//!
//! ## Usage
//! ```bash
//! cargo run -p snack-db --bin seed
//!
//! # Specify database path
//! cargo run -p snack-db --bin seed -- --db ./data/snacks.db
//! ```

use chrono::{Duration, Utc};
use snack_core::{NewSale, NewSaleItem, PurchaseType, SaleType, SnackInput};
use snack_db::{Database, DbConfig};
use std::env;

/// (name, purchase type, units/container, container cost, containers, unit price)
const UNIT_SNACKS: &[(&str, PurchaseType, i64, i64, i64, i64)] = &[
    ("Doritos", PurchaseType::Box, 12, 2400, 3, 500),
    ("Cheetos", PurchaseType::Box, 12, 2100, 2, 450),
    ("Chocolate bar", PurchaseType::Box, 24, 3600, 2, 300),
    ("Peanuts", PurchaseType::Bag, 30, 1500, 1, 150),
];

/// (name, purchase type, units/container, container cost, containers, combo units, combo price)
const COMBO_SNACKS: &[(&str, PurchaseType, i64, i64, i64, i64, i64)] = &[
    ("Gummies", PurchaseType::Bag, 24, 1200, 2, 3, 200),
    ("Mints", PurchaseType::Bag, 50, 1000, 1, 5, 150),
];

const PEOPLE: &[&str] = &["Ana", "Juan", "Maria", "Pedro", "Lucia"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./snacks_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Snack Manager Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./snacks_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Snack Manager Seed Data Generator");
    println!("=================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected, migrations applied");

    let existing = db.snacks().list().await?;
    if !existing.is_empty() {
        println!("⚠ Database already has {} snacks", existing.len());
        println!("  Skipping seed to avoid duplicates.");
        return Ok(());
    }

    let mut snacks = Vec::new();
    for &(name, purchase_type, units, cost, containers, price) in UNIT_SNACKS {
        snacks.push(
            db.snacks()
                .create(SnackInput {
                    name: name.to_string(),
                    purchase_type,
                    units_per_container: units,
                    container_cost_cents: cost,
                    containers_purchased: containers,
                    sale_type: SaleType::Unit,
                    unit_sale_price_cents: Some(price),
                    combo_units: None,
                    combo_price_cents: None,
                })
                .await?,
        );
    }
    for &(name, purchase_type, units, cost, containers, combo_units, combo_price) in COMBO_SNACKS {
        snacks.push(
            db.snacks()
                .create(SnackInput {
                    name: name.to_string(),
                    purchase_type,
                    units_per_container: units,
                    container_cost_cents: cost,
                    containers_purchased: containers,
                    sale_type: SaleType::Combo,
                    unit_sale_price_cents: None,
                    combo_units: Some(combo_units),
                    combo_price_cents: Some(combo_price),
                })
                .await?,
        );
    }
    println!("✓ Created {} snacks", snacks.len());

    let mut people = Vec::new();
    for name in PEOPLE {
        people.push(db.people().create(name).await?);
    }
    println!("✓ Created {} people", people.len());

    let today = Utc::now().date_naive();
    let mut recorded = 0;
    for day in 0..7i64 {
        for (idx, person) in people.iter().enumerate() {
            let snack = &snacks[(day as usize + idx) % snacks.len()];
            let item = match snack.sale_type {
                SaleType::Unit => NewSaleItem::units(&snack.id, 1 + (idx as i64 % 2)),
                SaleType::Combo => NewSaleItem::combos(&snack.id, 1),
            };
            let sale = NewSale {
                person_id: person.id.clone(),
                sale_date: today - Duration::days(day),
                items: vec![item],
                paid: (day + idx as i64) % 3 != 0,
            };

            match db.sales().create_sale(sale).await {
                Ok(_) => recorded += 1,
                Err(e) => eprintln!("Skipped sale for {}: {}", person.name, e),
            }
        }
    }
    println!("✓ Recorded {} sales", recorded);

    let reports = db.reports().get_reports().await?;
    println!();
    println!("Totals");
    println!("  Sales:       {} cents", reports.total_sales_cents);
    println!("  Investment:  {} cents", reports.total_investment_cents);
    println!("  Outstanding: {} cents", reports.total_outstanding_cents);

    db.close().await;
    Ok(())
}

//! # Seed Data Generator
//!
//! Populates a development database with sellers, margin ranges and a
//! hardware-store catalog.
//!
//! ## Usage
//! ```bash
//! cargo run -p stockroom-db --bin seed
//!
//! # Specify database path
//! cargo run -p stockroom-db --bin seed -- --db ./data/stockroom.db
//! ```
//!
//! ## Generated Data
//! - Users: one admin, two sales staff, one viewer
//! - Margin ranges: `[0, 100.00] → 10%`, `[100.01, ∞) → 5%`
//! - Products: sale price derived from the margin table

use std::env;
use stockroom_core::margin::{MarginBounds, MarginRangeInput, MarkupRate};
use stockroom_core::{NewProduct, Role};
use stockroom_db::{Database, DbConfig};
use tracing_subscriber::EnvFilter;

const USERS: &[(&str, Role)] = &[
    ("Admin", Role::Admin),
    ("Lucia", Role::Sales),
    ("Marco", Role::Sales),
    ("Auditor", Role::Viewer),
];

/// `(min_cents, max_cents, markup_bps)`
const RANGES: &[(i64, Option<i64>, u32)] = &[(0, Some(10_000), 1000), (10_001, None, 500)];

/// `(prefix, description, purchase_cents)`
const CATALOG: &[(&str, &str, i64)] = &[
    ("HAM", "Claw hammer 16oz", 1_450),
    ("SCR", "Screwdriver set 6pc", 2_200),
    ("NAI", "Box of nails 1kg", 380),
    ("DRL", "Cordless drill 18V", 48_000),
    ("SAW", "Hand saw 20in", 1_990),
    ("TAP", "Measuring tape 5m", 650),
    ("GLU", "Wood glue 500ml", 420),
    ("LAD", "Aluminium ladder 6 steps", 21_500),
    ("PNT", "Interior paint 4L white", 9_999),
    ("BRU", "Paint brush 2in", 175),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./stockroom_dev.db");

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
                println!("Stockroom Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./stockroom_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Stockroom Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    for (name, role) in USERS {
        db.users().insert(name, *role).await?;
    }
    println!("✓ Created {} users", USERS.len());

    for (min, max, bps) in RANGES {
        let input = MarginRangeInput {
            bounds: MarginBounds::new(*min, *max)?,
            markup: MarkupRate::from_bps(*bps),
        };
        db.margins().insert(&input).await?;
    }
    println!("✓ Created {} margin ranges", RANGES.len());

    let mut generated = 0;
    for (index, (prefix, description, purchase_cents)) in CATALOG.iter().enumerate() {
        let product = NewProduct {
            code: format!("{}-{:03}", prefix, index + 1),
            barcode: Some(format!("750{:010}", index + 1)),
            description: description.to_string(),
            location: Some(format!("Aisle {}", index % 4 + 1)),
            stock_max: 50,
            stock_min: 5,
            stock_qty: ((index * 7) % 40) as i64,
            purchase_price_cents: *purchase_cents,
            sale_price_cents: None,
            ..Default::default()
        };

        match db.products().insert(&product).await {
            Ok(inserted) => {
                generated += 1;
                println!(
                    "  {:<8} {:<28} cost {:>9}  price {:>9}",
                    inserted.code,
                    inserted.description,
                    inserted.purchase_price(),
                    inserted.sale_price()
                );
            }
            Err(e) => eprintln!("Failed to insert {}: {}", product.code, e),
        }
    }

    println!();
    println!("✓ Generated {} products", generated);
    println!("✓ Seed complete!");

    Ok(())
}

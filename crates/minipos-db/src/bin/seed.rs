//! # Seed Data Loader
//!
//! Loads the sample catalog and a sample customer for development.
//!
//! ## Usage
//! ```bash
//! cargo run -p minipos-db --bin seed
//!
//! # Specify database path
//! cargo run -p minipos-db --bin seed -- --db ./data/minipos.db
//! ```

use chrono::Utc;
use std::env;
use minipos_core::{Customer, Product};
use minipos_db::{Database, DbConfig};
use uuid::Uuid;

/// (name, barcode, price in cents, stock, reorder threshold)
const SAMPLE_PRODUCTS: &[(&str, &str, i64, i64, i64)] = &[
    ("Sample Product", "1000000000001", 1000, 50, 10),
    ("Coffee", "1000000000002", 2500, 100, 20),
    ("Notebook", "1000000000003", 500, 200, 25),
    ("Smartphone", "1000000000004", 150000, 25, 5),
    ("T-Shirt", "1000000000005", 3000, 75, 15),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = "./minipos.db".to_string();

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
                println!("MiniPOS Seed Data Loader");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./minipos.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 MiniPOS Seed Data Loader");
    println!("===========================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        db.close().await;
        return Ok(());
    }

    let now = Utc::now();
    for (name, barcode, price_cents, stock_quantity, min_stock) in SAMPLE_PRODUCTS {
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            barcode: Some(barcode.to_string()),
            price_cents: *price_cents,
            stock_quantity: *stock_quantity,
            min_stock: *min_stock,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        db.products().insert(&product).await?;
        println!("  + {} ({}) x{}  id={}", product.name, product.price(), product.stock_quantity, product.id);
    }

    let customer = Customer {
        id: Uuid::new_v4().to_string(),
        name: "Sample Customer".to_string(),
        email: Some("customer@example.com".to_string()),
        phone: None,
        loyalty_points: 0,
        created_at: now,
        updated_at: now,
    };
    db.customers().insert(&customer).await?;
    println!("  + customer {}  id={}", customer.name, customer.id);

    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}

//! Shared fixtures for the engine integration tests.

#![allow(dead_code)]

use std::path::PathBuf;

use chrono::Utc;
use minipos_core::{Customer, NewSale, NewSaleItem, Product};
use minipos_db::{Database, DbConfig};
use minipos_sales::{SaleEngine, SalesConfig};
use uuid::Uuid;

/// Engine over a fresh in-memory database.
pub async fn memory_engine(config: SalesConfig) -> SaleEngine {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    SaleEngine::new(db, config)
}

/// A database file in the temp dir, removed (with its WAL files) on drop.
pub struct TempDb {
    pub db: Database,
    path: PathBuf,
}

impl TempDb {
    pub async fn new() -> Self {
        let path = std::env::temp_dir().join(format!("minipos-test-{}.db", Uuid::new_v4()));
        let db = Database::new(DbConfig::new(&path).max_connections(8))
            .await
            .unwrap();
        TempDb { db, path }
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut file = self.path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }
}

pub async fn add_product(db: &Database, id: &str, price_cents: i64, stock: i64) {
    let now = Utc::now();
    db.products()
        .insert(&Product {
            id: id.to_string(),
            name: format!("Product {id}"),
            barcode: None,
            price_cents,
            stock_quantity: stock,
            min_stock: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap();
}

pub async fn add_customer(db: &Database, id: &str) {
    let now = Utc::now();
    db.customers()
        .insert(&Customer {
            id: id.to_string(),
            name: format!("Customer {id}"),
            email: None,
            phone: None,
            loyalty_points: 0,
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap();
}

pub async fn stock_of(db: &Database, id: &str) -> i64 {
    db.products()
        .get_by_id(id)
        .await
        .unwrap()
        .unwrap()
        .stock_quantity
}

pub async fn sale_count(db: &Database) -> i64 {
    db.sales().count().await.unwrap()
}

pub fn item(product_id: &str, quantity: i64) -> NewSaleItem {
    NewSaleItem {
        product_id: product_id.to_string(),
        quantity,
        unit_price: None,
    }
}

pub fn priced_item(product_id: &str, quantity: i64, unit_price: i64) -> NewSaleItem {
    NewSaleItem {
        unit_price: Some(unit_price),
        ..item(product_id, quantity)
    }
}

pub fn cash_sale(items: Vec<NewSaleItem>) -> NewSale {
    NewSale {
        items,
        payment_method: Some("cash".to_string()),
        ..Default::default()
    }
}

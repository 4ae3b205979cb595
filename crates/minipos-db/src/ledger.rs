//! # Inventory Ledger
//!
//! The only code path that moves `products.stock_quantity` during a sale.
//!
//! ## Reservation Is One Statement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ❌ check-then-act (two statements, racy)                               │
//! │     SELECT stock_quantity …        ← both callers see 1                 │
//! │     UPDATE … SET stock = stock - 1 ← both succeed, stock = -1           │
//! │                                                                         │
//! │  ✅ conditional decrement (one statement)                               │
//! │     UPDATE products                                                     │
//! │        SET stock_quantity = stock_quantity - :qty                       │
//! │      WHERE id = :id AND is_active = 1 AND stock_quantity >= :qty        │
//! │     RETURNING price_cents, name, stock_quantity                         │
//! │                                                                         │
//! │     Row returned → Reserved                                             │
//! │     No row       → Insufficient { available } | NotFound                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both operations run on the caller's open transaction, so a rollback
//! undoes every reservation the transaction granted.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;

use minipos_core::Money;

use crate::error::{DbError, DbResult};

/// Outcome of a conditional stock decrement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reservation {
    /// Stock was decremented. Carries the catalog snapshot read under the
    /// same write lock.
    Reserved {
        unit_price: Money,
        product_name: String,
        remaining: i64,
    },
    /// The product exists and is active but has fewer units than requested.
    Insufficient { available: i64 },
    /// The product is missing or inactive.
    NotFound,
}

/// Atomic stock reservation and restore against the catalog.
#[derive(Debug, Clone, Copy, Default)]
pub struct InventoryLedger;

impl InventoryLedger {
    pub const fn new() -> Self {
        InventoryLedger
    }

    /// Decrements stock by exactly `quantity` iff enough units are on hand.
    ///
    /// Never fails silently: an update that matches no row is classified as
    /// [`Reservation::Insufficient`] or [`Reservation::NotFound`].
    pub async fn reserve(
        &self,
        conn: &mut SqliteConnection,
        product_id: &str,
        quantity: i64,
    ) -> DbResult<Reservation> {
        let reserved: Option<(i64, String, i64)> = sqlx::query_as(
            r#"
            UPDATE products
               SET stock_quantity = stock_quantity - ?1,
                   updated_at = ?2
             WHERE id = ?3
               AND is_active = 1
               AND stock_quantity >= ?1
            RETURNING price_cents, name, stock_quantity
            "#,
        )
        .bind(quantity)
        .bind(Utc::now())
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await?;

        if let Some((price_cents, product_name, remaining)) = reserved {
            debug!(product_id = %product_id, quantity, remaining, "Stock reserved");
            return Ok(Reservation::Reserved {
                unit_price: Money::from_cents(price_cents),
                product_name,
                remaining,
            });
        }

        // The UPDATE above already holds the write lock, so this read is
        // consistent with the failed decrement.
        let current: Option<(i64, bool)> =
            sqlx::query_as("SELECT stock_quantity, is_active FROM products WHERE id = ?1")
                .bind(product_id)
                .fetch_optional(&mut *conn)
                .await?;

        let outcome = match current {
            Some((available, true)) => Reservation::Insufficient { available },
            _ => Reservation::NotFound,
        };
        debug!(product_id = %product_id, quantity, ?outcome, "Stock not reserved");
        Ok(outcome)
    }

    /// Puts `quantity` units back on the shelf.
    ///
    /// Applies to inactive products too: a product retired after the sale
    /// still gets its units back.
    pub async fn restore(
        &self,
        conn: &mut SqliteConnection,
        product_id: &str,
        quantity: i64,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE products
               SET stock_quantity = stock_quantity + ?1,
                   updated_at = ?2
             WHERE id = ?3
            "#,
        )
        .bind(quantity)
        .bind(Utc::now())
        .bind(product_id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", product_id));
        }

        debug!(product_id = %product_id, quantity, "Stock restored");
        Ok(())
    }
}

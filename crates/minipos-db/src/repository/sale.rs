//! # Sale Repository
//!
//! Database operations for sales and sale line items.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. COMMIT (one transaction, driven by SaleEngine)                     │
//! │     ├── InventoryLedger::reserve() per line                            │
//! │     ├── insert_sale()                                                  │
//! │     └── insert_item() per line                                         │
//! │                                                                         │
//! │  2. (OPTIONAL) STATUS CHANGE                                           │
//! │     └── lock() → set_status()                                          │
//! │                                                                         │
//! │  3. (OPTIONAL) VOID / DELETE                                           │
//! │     ├── lock() → InventoryLedger::restore() per line                   │
//! │     └── release()  or  delete()                                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{NaiveDate, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use minipos_core::{
    PaymentMethod, Sale, SaleLineItem, SaleStatus, SaleWithItems, DEFAULT_LIST_LIMIT,
    MAX_LIST_LIMIT,
};

const SALE_COLUMNS: &str = r#"
    id, customer_id, cashier_id,
    total_amount, discount_amount, tax_amount, final_amount,
    payment_method, status, notes, idempotency_key, stock_released,
    created_at, updated_at
"#;

const ITEM_COLUMNS: &str = r#"
    id, sale_id, product_id, product_name, quantity,
    unit_price, total_price, price_overridden, created_at
"#;

// =============================================================================
// Filter
// =============================================================================

/// Optional filters and paging for [`SaleRepository::list`].
///
/// Dates are inclusive calendar days in UTC. `limit` defaults to
/// `DEFAULT_LIST_LIMIT` and is clamped to `1..=MAX_LIST_LIMIT`; a negative
/// `offset` counts as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaleFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub customer_id: Option<String>,
    pub cashier_id: Option<String>,
    pub status: Option<SaleStatus>,
    pub payment_method: Option<PaymentMethod>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl SaleFilter {
    /// Page size actually applied.
    pub fn effective_limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .clamp(1, MAX_LIST_LIMIT)
    }

    /// Rows skipped before the page starts.
    pub fn effective_offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Gets a sale header by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets a sale with its line items, in the order they were requested.
    pub async fn get_with_items(&self, id: &str) -> DbResult<Option<SaleWithItems>> {
        let Some(sale) = self.get_by_id(id).await? else {
            return Ok(None);
        };
        let items = self.get_items(id).await?;

        Ok(Some(SaleWithItems { sale, items }))
    }

    /// Gets all line items of a sale.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleLineItem>> {
        let items = sqlx::query_as::<_, SaleLineItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY line_no"
        ))
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Finds the sale committed under a client idempotency key.
    pub async fn find_by_idempotency_key(&self, key: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE idempotency_key = ?1"
        ))
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Lists one page of sales, newest first.
    pub async fn list(&self, filter: &SaleFilter) -> DbResult<Vec<Sale>> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {SALE_COLUMNS} FROM sales WHERE 1 = 1"));

        if let Some(start) = filter.start_date {
            query
                .push(" AND DATE(created_at) >= ")
                .push_bind(start.format("%Y-%m-%d").to_string());
        }
        if let Some(end) = filter.end_date {
            query
                .push(" AND DATE(created_at) <= ")
                .push_bind(end.format("%Y-%m-%d").to_string());
        }
        if let Some(customer_id) = &filter.customer_id {
            query.push(" AND customer_id = ").push_bind(customer_id.clone());
        }
        if let Some(cashier_id) = &filter.cashier_id {
            query.push(" AND cashier_id = ").push_bind(cashier_id.clone());
        }
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status);
        }
        if let Some(method) = filter.payment_method {
            query.push(" AND payment_method = ").push_bind(method);
        }
        query
            .push(" ORDER BY created_at DESC, rowid DESC LIMIT ")
            .push_bind(filter.effective_limit())
            .push(" OFFSET ")
            .push_bind(filter.effective_offset());

        debug!(?filter, "Listing sales");

        let sales = query
            .build_query_as::<Sale>()
            .fetch_all(&self.pool)
            .await?;

        Ok(sales)
    }

    /// Counts line items of a sale (for diagnostics and tests).
    pub async fn count_items(&self, sale_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sale_items WHERE sale_id = ?1")
            .bind(sale_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Counts all sales.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // -------------------------------------------------------------------------
    // Writes (caller's transaction)
    // -------------------------------------------------------------------------

    /// Inserts a sale header.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` on `sales.idempotency_key` when a
    ///   concurrent commit with the same key won
    pub async fn insert_sale(&self, conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
        debug!(sale_id = %sale.id, "Inserting sale");

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, customer_id, cashier_id,
                total_amount, discount_amount, tax_amount, final_amount,
                payment_method, status, notes, idempotency_key, stock_released,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.customer_id)
        .bind(&sale.cashier_id)
        .bind(sale.total_amount)
        .bind(sale.discount_amount)
        .bind(sale.tax_amount)
        .bind(sale.final_amount)
        .bind(sale.payment_method)
        .bind(sale.status)
        .bind(&sale.notes)
        .bind(&sale.idempotency_key)
        .bind(sale.stock_released)
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Inserts one line item. `line_no` preserves request order.
    pub async fn insert_item(
        &self,
        conn: &mut SqliteConnection,
        item: &SaleLineItem,
        line_no: i64,
    ) -> DbResult<()> {
        debug!(sale_id = %item.sale_id, product_id = %item.product_id, "Inserting sale item");

        sqlx::query(
            r#"
            INSERT INTO sale_items (
                id, sale_id, product_id, product_name, quantity,
                unit_price, total_price, price_overridden, line_no, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&item.id)
        .bind(&item.sale_id)
        .bind(&item.product_id)
        .bind(&item.product_name)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.total_price)
        .bind(item.price_overridden)
        .bind(line_no)
        .bind(item.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Takes the write lock on a sale and returns its current header.
    ///
    /// Issued as an UPDATE so it is the first write of the transaction;
    /// everything read afterwards on `conn` is stable until commit.
    pub async fn lock(&self, conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "UPDATE sales SET updated_at = ?2 WHERE id = ?1 RETURNING {SALE_COLUMNS}"
        ))
        .bind(id)
        .bind(Utc::now())
        .fetch_optional(&mut *conn)
        .await?;

        Ok(sale)
    }

    /// Gets all line items of a sale on the caller's connection.
    pub async fn items_on(
        &self,
        conn: &mut SqliteConnection,
        sale_id: &str,
    ) -> DbResult<Vec<SaleLineItem>> {
        let items = sqlx::query_as::<_, SaleLineItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY line_no"
        ))
        .bind(sale_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(items)
    }

    /// Sets the status without touching stock.
    pub async fn set_status(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        status: SaleStatus,
    ) -> DbResult<()> {
        let result = sqlx::query("UPDATE sales SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .bind(Utc::now())
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", id));
        }

        Ok(())
    }

    /// Records that the sale's stock has been restored, and sets its status.
    ///
    /// Matches only while `stock_released = 0`, so a sale is released at
    /// most once.
    pub async fn release(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        status: SaleStatus,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE sales
               SET status = ?2, stock_released = 1, updated_at = ?3
             WHERE id = ?1 AND stock_released = 0
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale (unreleased)", id));
        }

        Ok(())
    }

    /// Hard-deletes a sale. Line items go with it (ON DELETE CASCADE).
    pub async fn delete(&self, conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
        debug!(sale_id = %id, "Deleting sale");

        let result = sqlx::query("DELETE FROM sales WHERE id = ?1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", id));
        }

        Ok(())
    }
}

/// Generates a new sale ID.
pub fn generate_sale_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generates a new sale item ID.
pub fn generate_sale_item_id() -> String {
    Uuid::new_v4().to_string()
}

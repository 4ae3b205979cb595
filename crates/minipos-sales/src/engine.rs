//! # Sale Commit Engine
//!
//! Records a sale as one indivisible unit of work.
//!
//! ## Commit States
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Validating ──► Reserving ──► Persisting ──► Committed                  │
//! │      │              │              │              │                      │
//! │      │              │              │              └─► loyalty (best-     │
//! │      ▼              ▼              ▼                  effort, logged)   │
//! │   Aborted        Aborted        Aborted                                 │
//! │  (no effects)   (ROLLBACK)     (ROLLBACK)                               │
//! │                                                                         │
//! │  Reserving + Persisting share ONE transaction. The first statement is   │
//! │  the ledger's conditional UPDATE, so the write lock is held from the    │
//! │  first reservation to COMMIT and racing tills are serialized by SQLite. │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The transactional part runs under `SalesConfig::commit_timeout`. When it
//! expires the future is dropped, which drops the transaction, and SQLite
//! discards every reservation it made.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqliteConnection, Transaction};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use minipos_core::pricing::SaleTotals;
use minipos_core::validation::{validate_idempotency_key, validate_sale_request, ValidatedSale};
use minipos_core::{NewSale, Sale, SaleLineItem, SaleWithItems};
use minipos_db::repository::sale::{generate_sale_id, generate_sale_item_id};
use minipos_db::{Database, DbError, Reservation, SaleFilter};

use crate::config::SalesConfig;
use crate::error::{SaleError, SaleResult};
use crate::loyalty::{CustomerLoyalty, LoyaltyAccrual};

const IDEMPOTENCY_CONSTRAINT: &str = "sales.idempotency_key";

// =============================================================================
// Request / Outcome
// =============================================================================

/// Per-request metadata that does not belong in the sale body.
#[derive(Debug, Clone, Default)]
pub struct CommitContext {
    /// Cashier ringing up the sale; falls back to the configured default.
    pub cashier_id: Option<String>,
    /// Client key that makes a retried submission return the first result.
    pub idempotency_key: Option<String>,
}

/// Result of a successful [`SaleEngine::commit`].
#[derive(Debug, Clone)]
pub struct CommitOutcome {
    pub sale: SaleWithItems,
    /// True when the idempotency key matched an earlier commit and nothing
    /// new was written.
    pub replayed: bool,
}

enum Attempt {
    Committed(SaleWithItems),
    /// Lost the unique-key race to a concurrent commit with the same key.
    DuplicateKey(String),
}

// =============================================================================
// Engine
// =============================================================================

/// Validates, reserves, persists and commits sales.
///
/// Cheap to clone; clones share the database pool, config and loyalty store.
#[derive(Clone)]
pub struct SaleEngine {
    pub(crate) db: Database,
    pub(crate) config: Arc<SalesConfig>,
    loyalty: Arc<dyn LoyaltyAccrual>,
}

impl SaleEngine {
    /// Creates an engine that credits loyalty points to the `customers` table.
    pub fn new(db: Database, config: SalesConfig) -> Self {
        let loyalty = Arc::new(CustomerLoyalty::new(db.customers()));
        SaleEngine {
            db,
            config: Arc::new(config),
            loyalty,
        }
    }

    /// Replaces the loyalty store.
    pub fn with_loyalty(mut self, loyalty: Arc<dyn LoyaltyAccrual>) -> Self {
        self.loyalty = loyalty;
        self
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &SalesConfig {
        &self.config
    }

    // -------------------------------------------------------------------------
    // Commit
    // -------------------------------------------------------------------------

    /// Commits a sale: every line reserved and every row written, or nothing.
    ///
    /// ## Errors
    /// - [`SaleError::Validation`] - malformed request, disallowed payment
    ///   method, discount above the line total
    /// - [`SaleError::NotFound`] - unknown customer (also when it is deleted
    ///   while the commit runs), missing or inactive product
    /// - [`SaleError::InsufficientStock`] - first line that cannot be covered
    /// - [`SaleError::Persistence`] - store failure or commit timeout
    pub async fn commit(&self, request: &NewSale, ctx: CommitContext) -> SaleResult<CommitOutcome> {
        // Validating
        let validated = validate_sale_request(request, &self.config.payment_methods)?;
        let idempotency_key = ctx
            .idempotency_key
            .as_deref()
            .map(validate_idempotency_key)
            .transpose()?;
        let cashier_id = match ctx.cashier_id.as_deref().map(str::trim) {
            Some(cashier) if !cashier.is_empty() => cashier.to_string(),
            _ => self.config.default_cashier.clone(),
        };
        debug!(lines = validated.lines.len(), cashier_id = %cashier_id, "Sale request validated");

        if let Some(key) = &idempotency_key {
            if let Some(outcome) = self.replay(key).await? {
                return Ok(outcome);
            }
        }

        if let Some(customer_id) = &validated.customer_id {
            if !self.db.customers().exists(customer_id).await? {
                warn!(customer_id = %customer_id, "Unknown customer; sale aborted");
                return Err(SaleError::not_found("Customer", customer_id.clone()));
            }
        }

        let attempt = self
            .bounded("commit", self.run_commit(&validated, cashier_id, idempotency_key))
            .await?;

        let sale = match attempt {
            Attempt::Committed(sale) => sale,
            Attempt::DuplicateKey(key) => {
                return self.replay(&key).await?.ok_or_else(|| SaleError::Persistence {
                    message: format!("sale for idempotency key '{key}' vanished"),
                    retryable: true,
                });
            }
        };

        info!(
            sale_id = %sale.sale.id,
            final_amount = sale.sale.final_amount,
            lines = sale.items.len(),
            "Sale committed"
        );

        self.accrue_loyalty(&sale.sale).await;

        Ok(CommitOutcome {
            sale,
            replayed: false,
        })
    }

    async fn run_commit(
        &self,
        req: &ValidatedSale,
        cashier_id: String,
        idempotency_key: Option<String>,
    ) -> SaleResult<Attempt> {
        let sale_id = generate_sale_id();
        let mut tx = self.db.begin().await?;

        match self
            .reserve_and_persist(&mut tx, &sale_id, Utc::now(), req, cashier_id, idempotency_key)
            .await
        {
            Ok(Attempt::Committed(sale)) => {
                tx.commit().await.map_err(DbError::from)?;
                Ok(Attempt::Committed(sale))
            }
            Ok(duplicate) => {
                rollback(tx, &sale_id).await;
                Ok(duplicate)
            }
            Err(err) => {
                warn!(sale_id = %sale_id, error = %err, "Sale aborted; rolling back");
                rollback(tx, &sale_id).await;
                Err(err)
            }
        }
    }

    async fn reserve_and_persist(
        &self,
        conn: &mut SqliteConnection,
        sale_id: &str,
        now: DateTime<Utc>,
        req: &ValidatedSale,
        cashier_id: String,
        idempotency_key: Option<String>,
    ) -> SaleResult<Attempt> {
        let ledger = self.db.ledger();
        let sales = self.db.sales();

        // Reserving
        let mut items = Vec::with_capacity(req.lines.len());
        for (idx, line) in req.lines.iter().enumerate() {
            debug!(sale_id, product_id = %line.product_id, quantity = line.quantity, "Reserving stock");

            let (catalog_price, product_name) =
                match ledger.reserve(conn, &line.product_id, line.quantity).await? {
                    Reservation::Reserved {
                        unit_price,
                        product_name,
                        ..
                    } => (unit_price, product_name),
                    Reservation::Insufficient { available } => {
                        warn!(
                            sale_id,
                            product_id = %line.product_id,
                            requested = line.quantity,
                            available,
                            "Insufficient stock"
                        );
                        return Err(SaleError::InsufficientStock {
                            product_id: line.product_id.clone(),
                            requested: line.quantity,
                            available,
                        });
                    }
                    Reservation::NotFound => {
                        return Err(SaleError::not_found("Product", line.product_id.clone()));
                    }
                };

            let (unit_price, price_overridden) = self
                .config
                .pricing
                .resolve_unit_price(catalog_price, line.proposed_price);
            if price_overridden {
                warn!(
                    sale_id,
                    product_id = %line.product_id,
                    catalog_price = catalog_price.cents(),
                    charged_price = unit_price.cents(),
                    "Caller-supplied unit price accepted"
                );
            }

            let total_price = unit_price
                .checked_multiply_quantity(line.quantity)
                .ok_or_else(|| SaleError::validation(format!("items[{idx}] total is out of range")))?;

            items.push(SaleLineItem {
                id: generate_sale_item_id(),
                sale_id: sale_id.to_string(),
                product_id: line.product_id.clone(),
                product_name,
                quantity: line.quantity,
                unit_price: unit_price.cents(),
                total_price: total_price.cents(),
                price_overridden,
                created_at: now,
            });
        }

        // Persisting
        let totals = SaleTotals::compute(
            items.iter().map(SaleLineItem::total_price),
            req.discount,
            req.tax,
            self.config.tax,
        )?;
        debug!(sale_id, final_amount = totals.final_amount.cents(), "Persisting sale");

        let sale = Sale {
            id: sale_id.to_string(),
            customer_id: req.customer_id.clone(),
            cashier_id,
            total_amount: totals.total_amount.cents(),
            discount_amount: totals.discount_amount.cents(),
            tax_amount: totals.tax_amount.cents(),
            final_amount: totals.final_amount.cents(),
            payment_method: req.payment_method,
            status: req.status,
            notes: req.notes.clone(),
            idempotency_key,
            stock_released: false,
            created_at: now,
            updated_at: now,
        };

        match sales.insert_sale(conn, &sale).await {
            Ok(()) => {}
            Err(err) if err.is_unique_violation_on(IDEMPOTENCY_CONSTRAINT) => {
                let key = sale.idempotency_key.unwrap_or_default();
                info!(sale_id, idempotency_key = %key, "Concurrent duplicate submission");
                return Ok(Attempt::DuplicateKey(key));
            }
            // customer_id is the only foreign key on sales
            Err(DbError::ForeignKeyViolation { .. }) if sale.customer_id.is_some() => {
                let customer_id = sale.customer_id.unwrap_or_default();
                warn!(sale_id, customer_id = %customer_id, "Customer removed during commit");
                return Err(SaleError::not_found("Customer", customer_id));
            }
            Err(err) => return Err(err.into()),
        }
        for (line_no, item) in items.iter().enumerate() {
            sales.insert_item(conn, item, line_no as i64).await?;
        }

        Ok(Attempt::Committed(SaleWithItems { sale, items }))
    }

    async fn replay(&self, key: &str) -> SaleResult<Option<CommitOutcome>> {
        let Some(sale) = self.db.sales().find_by_idempotency_key(key).await? else {
            return Ok(None);
        };
        let items = self.db.sales().get_items(&sale.id).await?;

        info!(sale_id = %sale.id, idempotency_key = %key, "Replaying committed sale");
        Ok(Some(CommitOutcome {
            sale: SaleWithItems { sale, items },
            replayed: true,
        }))
    }

    async fn accrue_loyalty(&self, sale: &Sale) {
        let Some(customer_id) = sale.customer_id.as_deref() else {
            return;
        };
        let points = sale.final_amount().loyalty_points(self.config.loyalty_rate);
        if points <= 0 {
            return;
        }

        match self.loyalty.accrue(customer_id, points).await {
            Ok(()) => debug!(sale_id = %sale.id, customer_id, points, "Loyalty points accrued"),
            Err(err) => warn!(
                sale_id = %sale.id,
                customer_id,
                points,
                error = %err,
                "Loyalty accrual failed; sale remains committed"
            ),
        }
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Fetches one sale with its line items.
    pub async fn get(&self, id: &str) -> SaleResult<SaleWithItems> {
        self.db
            .sales()
            .get_with_items(id)
            .await?
            .ok_or_else(|| SaleError::not_found("Sale", id))
    }

    /// Lists sales newest first.
    pub async fn list(&self, filter: &SaleFilter) -> SaleResult<Vec<Sale>> {
        Ok(self.db.sales().list(filter).await?)
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    /// Runs `fut` under the configured commit timeout.
    pub(crate) async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> SaleResult<T>
    where
        F: Future<Output = SaleResult<T>>,
    {
        let limit = self.config.commit_timeout;
        match timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => {
                error!(
                    operation,
                    timeout_ms = limit.as_millis() as u64,
                    "Operation timed out; transaction rolled back"
                );
                Err(SaleError::timed_out(operation, limit))
            }
        }
    }
}

/// Rolls back explicitly so the lock is released before the response.
pub(crate) async fn rollback(tx: Transaction<'static, Sqlite>, sale_id: &str) {
    if let Err(err) = tx.rollback().await {
        // The connection discards the transaction when it returns to the pool
        error!(sale_id, error = %err, "Rollback failed");
    }
}

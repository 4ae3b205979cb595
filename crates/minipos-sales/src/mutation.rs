//! # Sale Mutation
//!
//! Status changes, voids and hard deletes of committed sales.
//!
//! ```text
//! ┌──────────────────┬─────────────────────────────┬───────────────────────┐
//! │ Operation        │ Status                      │ Stock                 │
//! ├──────────────────┼─────────────────────────────┼───────────────────────┤
//! │ update_status    │ per transition table        │ untouched             │
//! │ void             │ pending→cancelled           │ restored (once)       │
//! │                  │ completed→refunded          │                       │
//! │ delete           │ row removed                 │ restored unless a     │
//! │                  │                             │ void already did      │
//! └──────────────────┴─────────────────────────────┴───────────────────────┘
//! ```
//!
//! Each operation is one transaction opened by [`SaleRepository::lock`], so
//! two tills voiding the same sale are serialized and only one restores.
//!
//! [`SaleRepository::lock`]: minipos_db::SaleRepository::lock

use sqlx::SqliteConnection;
use tracing::{debug, info};

use minipos_core::{CoreError, Sale, SaleStatus, SaleWithItems};
use minipos_db::DbError;

use crate::engine::{rollback, SaleEngine};
use crate::error::{SaleError, SaleResult};

/// What [`SaleEngine::delete`] removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedSale {
    pub id: String,
    /// Whether this delete put units back (false when a void already had).
    pub stock_restored: bool,
}

impl SaleEngine {
    /// Moves a sale along the status transition table without touching stock.
    pub async fn update_status(&self, id: &str, target: SaleStatus) -> SaleResult<SaleWithItems> {
        self.bounded("update_status", self.run_update_status(id, target))
            .await?;
        info!(sale_id = %id, status = %target, "Sale status changed");
        self.get(id).await
    }

    /// Reverses a sale's stock effect and marks it cancelled or refunded.
    pub async fn void(&self, id: &str) -> SaleResult<SaleWithItems> {
        let status = self.bounded("void", self.run_void(id)).await?;
        info!(sale_id = %id, status = %status, "Sale voided");
        self.get(id).await
    }

    /// Removes a sale and its line items, restoring stock exactly once.
    pub async fn delete(&self, id: &str) -> SaleResult<DeletedSale> {
        let deleted = self.bounded("delete", self.run_delete(id)).await?;
        info!(
            sale_id = %id,
            stock_restored = deleted.stock_restored,
            "Sale deleted"
        );
        Ok(deleted)
    }

    async fn run_update_status(&self, id: &str, target: SaleStatus) -> SaleResult<()> {
        let mut tx = self.db.begin().await?;

        let sale = match self.lock_sale(&mut tx, id).await {
            Ok(sale) => sale,
            Err(err) => {
                rollback(tx, id).await;
                return Err(err);
            }
        };

        if !sale.status.can_transition_to(target) {
            rollback(tx, id).await;
            return Err(CoreError::InvalidStatusTransition {
                from: sale.status,
                to: target,
            }
            .into());
        }

        self.db.sales().set_status(&mut tx, id, target).await?;
        tx.commit().await.map_err(DbError::from)?;
        Ok(())
    }

    async fn run_void(&self, id: &str) -> SaleResult<SaleStatus> {
        let mut tx = self.db.begin().await?;

        let sale = match self.lock_sale(&mut tx, id).await {
            Ok(sale) => sale,
            Err(err) => {
                rollback(tx, id).await;
                return Err(err);
            }
        };

        let Some(target) = sale.status.void_target() else {
            rollback(tx, id).await;
            return Err(CoreError::AlreadyVoided {
                sale_id: id.to_string(),
                status: sale.status,
            }
            .into());
        };

        if sale.stock_released {
            self.db.sales().set_status(&mut tx, id, target).await?;
        } else {
            self.restore_lines(&mut tx, id).await?;
            self.db.sales().release(&mut tx, id, target).await?;
        }

        tx.commit().await.map_err(DbError::from)?;
        Ok(target)
    }

    async fn run_delete(&self, id: &str) -> SaleResult<DeletedSale> {
        let mut tx = self.db.begin().await?;

        let sale = match self.lock_sale(&mut tx, id).await {
            Ok(sale) => sale,
            Err(err) => {
                rollback(tx, id).await;
                return Err(err);
            }
        };

        let stock_restored = !sale.stock_released;
        if stock_restored {
            self.restore_lines(&mut tx, id).await?;
        } else {
            debug!(sale_id = %id, "Stock already released by a void");
        }
        self.db.sales().delete(&mut tx, id).await?;

        tx.commit().await.map_err(DbError::from)?;
        Ok(DeletedSale {
            id: id.to_string(),
            stock_restored,
        })
    }

    async fn lock_sale(&self, conn: &mut SqliteConnection, id: &str) -> SaleResult<Sale> {
        self.db
            .sales()
            .lock(conn, id)
            .await?
            .ok_or_else(|| SaleError::not_found("Sale", id))
    }

    async fn restore_lines(&self, conn: &mut SqliteConnection, sale_id: &str) -> SaleResult<()> {
        let ledger = self.db.ledger();
        for item in self.db.sales().items_on(conn, sale_id).await? {
            ledger.restore(conn, &item.product_id, item.quantity).await?;
        }
        Ok(())
    }
}

//! # Loyalty Accrual
//!
//! Post-commit, best-effort side effect. A failure here is logged by the
//! engine and never reaches the caller of `commit`.

use async_trait::async_trait;
use minipos_db::{CustomerRepository, DbError};
use thiserror::Error;

/// Loyalty store failure.
#[derive(Debug, Error)]
#[error("Loyalty accrual failed: {0}")]
pub struct LoyaltyError(pub String);

impl From<DbError> for LoyaltyError {
    fn from(err: DbError) -> Self {
        LoyaltyError(err.to_string())
    }
}

/// A store that credits loyalty points to customers.
#[async_trait]
pub trait LoyaltyAccrual: Send + Sync {
    /// Adds `points` to the customer's balance.
    async fn accrue(&self, customer_id: &str, points: i64) -> Result<(), LoyaltyError>;
}

/// [`LoyaltyAccrual`] backed by the `customers` table.
#[derive(Debug, Clone)]
pub struct CustomerLoyalty {
    customers: CustomerRepository,
}

impl CustomerLoyalty {
    pub fn new(customers: CustomerRepository) -> Self {
        CustomerLoyalty { customers }
    }
}

#[async_trait]
impl LoyaltyAccrual for CustomerLoyalty {
    async fn accrue(&self, customer_id: &str, points: i64) -> Result<(), LoyaltyError> {
        self.customers.accrue_loyalty(customer_id, points).await?;
        Ok(())
    }
}

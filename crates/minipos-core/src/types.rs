//! # Domain Types
//!
//! Core domain types used throughout MiniPOS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │  SaleLineItem   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id (UUID)      │   │  sale_id (FK)   │       │
//! │  │  price_cents    │   │  status         │   │  unit_price ❄   │       │
//! │  │  stock_quantity │   │  final_amount   │   │  total_price ❄  │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Customer     │   │   SaleStatus    │   │ PaymentMethod   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  loyalty_points │   │  Pending        │   │  Cash           │       │
//! │  └─────────────────┘   │  Completed      │   │  Card           │       │
//! │                        │  Cancelled      │   │  Digital        │       │
//! │                        │  Refunded       │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! │  ❄ = frozen at commit time (snapshot pattern)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Rates
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 825 bps = 8.25%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

/// Loyalty points earned per whole currency unit, in basis points.
///
/// 10000 bps = 1 point per unit spent (the default).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LoyaltyRate(u32);

impl LoyaltyRate {
    /// Creates a loyalty rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        LoyaltyRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }
}

impl Default for LoyaltyRate {
    fn default() -> Self {
        LoyaltyRate(10_000)
    }
}

// =============================================================================
// Product
// =============================================================================

/// A catalog product.
///
/// `stock_quantity` is only ever changed through the inventory ledger
/// (conditional decrement / restore) or explicit administrative edits.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub barcode: Option<String>,
    /// Current catalog price in cents.
    pub price_cents: i64,
    /// Units on hand. Never negative.
    pub stock_quantity: i64,
    /// Reorder threshold (informational only).
    pub min_stock: i64,
    /// Soft-delete flag. Inactive products cannot be sold.
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the catalog price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer who may accrue loyalty points.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub loyalty_points: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a sale.
///
/// ## Transition Table
/// ```text
/// pending ──► completed ──► refunded
///    │
///    └──────► cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Recorded, awaiting completion (stock already reserved).
    Pending,
    /// Paid and final.
    Completed,
    /// Abandoned before completion.
    Cancelled,
    /// Reversed after completion.
    Refunded,
}

impl SaleStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [SaleStatus; 4] = [
        SaleStatus::Pending,
        SaleStatus::Completed,
        SaleStatus::Cancelled,
        SaleStatus::Refunded,
    ];

    /// Returns true if `self → next` is in the transition table.
    pub fn can_transition_to(self, next: SaleStatus) -> bool {
        matches!(
            (self, next),
            (SaleStatus::Pending, SaleStatus::Completed)
                | (SaleStatus::Pending, SaleStatus::Cancelled)
                | (SaleStatus::Completed, SaleStatus::Refunded)
        )
    }

    /// The status a void moves this sale to, if it can be voided at all.
    pub fn void_target(self) -> Option<SaleStatus> {
        match self {
            SaleStatus::Pending => Some(SaleStatus::Cancelled),
            SaleStatus::Completed => Some(SaleStatus::Refunded),
            SaleStatus::Cancelled | SaleStatus::Refunded => None,
        }
    }

    /// Lowercase name used in the database and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Pending => "pending",
            SaleStatus::Completed => "completed",
            SaleStatus::Cancelled => "cancelled",
            SaleStatus::Refunded => "refunded",
        }
    }
}

impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::Completed
    }
}

impl fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SaleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SaleStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| s.to_string())
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card payment on a terminal.
    Card,
    /// Wallet / QR / transfer.
    Digital,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 3] =
        [PaymentMethod::Cash, PaymentMethod::Card, PaymentMethod::Digital];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Digital => "digital",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentMethod::ALL
            .into_iter()
            .find(|method| method.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| s.to_string())
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A committed sale header.
///
/// Created exactly once by the commit engine, together with all of its line
/// items and stock decrements.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub customer_id: Option<String>,
    pub cashier_id: String,
    /// Σ line.total_price
    pub total_amount: i64,
    pub discount_amount: i64,
    pub tax_amount: i64,
    /// total_amount − discount_amount + tax_amount
    pub final_amount: i64,
    pub payment_method: PaymentMethod,
    pub status: SaleStatus,
    pub notes: Option<String>,
    pub idempotency_key: Option<String>,
    /// True once a void or delete has put this sale's units back on the shelf.
    pub stock_released: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    /// Returns the final amount as Money.
    #[inline]
    pub fn final_amount(&self) -> Money {
        Money::from_cents(self.final_amount)
    }
}

// =============================================================================
// Sale Line Item
// =============================================================================

/// A line item in a sale.
/// Uses snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleLineItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub product_name: String,
    pub quantity: i64,
    /// Unit price in cents at time of sale (frozen).
    pub unit_price: i64,
    /// unit_price × quantity (frozen).
    pub total_price: i64,
    /// Set when the caller's price was used instead of the catalog price.
    pub price_overridden: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl SaleLineItem {
    /// Returns the line total as Money.
    #[inline]
    pub fn total_price(&self) -> Money {
        Money::from_cents(self.total_price)
    }
}

/// A sale together with its line items, as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleWithItems {
    #[serde(flatten)]
    pub sale: Sale,
    pub items: Vec<SaleLineItem>,
}

impl SaleWithItems {
    /// Recomputes `Σ line.total_price − discount + tax` from the stored rows.
    pub fn recomputed_final_amount(&self) -> Money {
        let lines: Money = self.items.iter().map(SaleLineItem::total_price).sum();
        lines - Money::from_cents(self.sale.discount_amount) + Money::from_cents(self.sale.tax_amount)
    }
}

// =============================================================================
// Sale Request
// =============================================================================

/// A request to commit a new sale.
///
/// Fields are deliberately loose (`Option`, raw strings, signed quantities)
/// so that malformed input reaches validation and gets a precise
/// [`ValidationError`](crate::ValidationError) instead of a decode failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSale {
    pub customer_id: Option<String>,
    #[serde(default)]
    pub items: Vec<NewSaleItem>,
    pub discount_amount: Option<i64>,
    pub tax_amount: Option<i64>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    /// Initial status: `completed` (default) or `pending`.
    pub status: Option<String>,
}

/// One requested line of a [`NewSale`].
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSaleItem {
    pub product_id: String,
    pub quantity: i64,
    /// Caller-proposed unit price. Ignored unless price overrides are allowed.
    pub unit_price: Option<i64>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_rate_from_bps() {
        let rate = TaxRate::from_bps(825);
        assert_eq!(rate.bps(), 825);
        assert!((rate.percentage() - 8.25).abs() < 0.001);
    }

    #[test]
    fn test_status_transition_table() {
        use SaleStatus::*;

        assert!(Pending.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Completed.can_transition_to(Refunded));

        assert!(!Pending.can_transition_to(Refunded));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Completed.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(Completed));
        assert!(!Refunded.can_transition_to(Completed));
        for status in SaleStatus::ALL {
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn test_void_target() {
        assert_eq!(SaleStatus::Pending.void_target(), Some(SaleStatus::Cancelled));
        assert_eq!(SaleStatus::Completed.void_target(), Some(SaleStatus::Refunded));
        assert_eq!(SaleStatus::Cancelled.void_target(), None);
        assert_eq!(SaleStatus::Refunded.void_target(), None);
    }

    #[test]
    fn test_status_parse_and_display() {
        assert_eq!("Completed".parse::<SaleStatus>(), Ok(SaleStatus::Completed));
        assert_eq!(SaleStatus::Refunded.to_string(), "refunded");
        assert!("shipped".parse::<SaleStatus>().is_err());
    }

    #[test]
    fn test_payment_method_parse() {
        assert_eq!("cash".parse::<PaymentMethod>(), Ok(PaymentMethod::Cash));
        assert_eq!(" CARD ".parse::<PaymentMethod>(), Ok(PaymentMethod::Card));
        assert!("cheque".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_sale_request_decodes_with_defaults() {
        let req: NewSale = serde_json::from_str(
            r#"{"items":[{"product_id":"p1","quantity":2}],"payment_method":"cash"}"#,
        )
        .unwrap();
        assert_eq!(req.items.len(), 1);
        assert_eq!(req.items[0].unit_price, None);
        assert_eq!(req.discount_amount, None);
        assert!(req.customer_id.is_none());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&SaleStatus::Cancelled).unwrap();
        assert_eq!(json, "\"cancelled\"");
    }
}

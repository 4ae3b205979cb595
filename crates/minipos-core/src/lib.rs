//! # minipos-core: Pure Business Logic for MiniPOS
//!
//! This crate holds the rules of a sale as pure functions with zero I/O
//! dependencies. Everything that touches SQLite lives in `minipos-db`, and
//! the commit protocol that stitches both together lives in `minipos-sales`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        MiniPOS Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 HTTP Server (apps/server)                       │   │
//! │  │    POST /sales ──► PATCH /sales/{id}/status ──► DELETE ...      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              minipos-sales (Sale Commit Engine)                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ minipos-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  pricing  │  │ validation│  │   │
//! │  │   │  Product  │  │   Money   │  │  Totals   │  │   rules   │  │   │
//! │  │   │   Sale    │  │  TaxRate  │  │  Loyalty  │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, SaleLineItem, Customer, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`pricing`] - Sale totals, tax policy and loyalty points
//! - [`error`] - Domain error types
//! - [`validation`] - Sale request validation
//!
//! ## Example Usage
//!
//! ```rust
//! use minipos_core::money::Money;
//! use minipos_core::pricing::{SaleTotals, TaxPolicy};
//!
//! let lines = [Money::from_cents(2500).multiply_quantity(2)];
//! let totals = SaleTotals::compute(
//!     lines.iter().copied(),
//!     Money::zero(),
//!     Money::from_cents(250),
//!     TaxPolicy::CallerSupplied,
//! )
//! .unwrap();
//!
//! assert_eq!(totals.final_amount.cents(), 5250);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items allowed in a single sale.
///
/// ## Business Reason
/// Prevents runaway orders and keeps the commit transaction short.
pub const MAX_SALE_ITEMS: usize = 100;

/// Maximum quantity of a single line item.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum single amount in cents (unit price, discount or tax) a request may
/// carry: 10 billion in major units.
///
/// ## Business Reason
/// `MAX_SALE_ITEMS × MAX_ITEM_QUANTITY × MAX_AMOUNT_CENTS` stays far below
/// `i64::MAX`, so caller-supplied amounts cannot overflow a sale total.
pub const MAX_AMOUNT_CENTS: i64 = 1_000_000_000_000;

/// Default page size for sale listings.
pub const DEFAULT_LIST_LIMIT: i64 = 50;

/// Largest page a sale listing returns.
pub const MAX_LIST_LIMIT: i64 = 500;

/// Maximum length of free-form sale notes.
pub const MAX_NOTES_LEN: usize = 500;

/// Maximum length of a client-supplied idempotency key.
pub const MAX_IDEMPOTENCY_KEY_LEN: usize = 128;

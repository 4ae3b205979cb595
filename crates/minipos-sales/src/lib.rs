//! # minipos-sales: Sale Commit Engine
//!
//! Guarantees that no sale is ever partially applied and that stock never
//! goes negative, even when tills check out concurrently.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  apps/server (HTTP)                                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               minipos-sales (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   SaleEngine::commit ─────► validate (minipos-core)             │   │
//! │  │         │                                                       │   │
//! │  │         ├──► BEGIN                                              │   │
//! │  │         ├──► InventoryLedger::reserve × N                       │   │
//! │  │         ├──► insert sale + line items                           │   │
//! │  │         ├──► COMMIT            (any failure → ROLLBACK)         │   │
//! │  │         └──► LoyaltyAccrual    (best-effort)                    │   │
//! │  │                                                                 │   │
//! │  │   SaleEngine::{update_status, void, delete}                     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  minipos-db (SQLite)                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! use minipos_sales::{CommitContext, SaleEngine, SalesConfig};
//!
//! let engine = SaleEngine::new(db, SalesConfig::default());
//! let outcome = engine.commit(&request, CommitContext::default()).await?;
//! println!("committed {}", outcome.sale.sale.id);
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod loyalty;
pub mod mutation;

pub use config::SalesConfig;
pub use engine::{CommitContext, CommitOutcome, SaleEngine};
pub use error::{SaleError, SaleResult};
pub use loyalty::{CustomerLoyalty, LoyaltyAccrual, LoyaltyError};
pub use mutation::DeletedSale;

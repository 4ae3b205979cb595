//! # Repository Module
//!
//! Database repository implementations for MiniPOS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SaleEngine / HTTP handler                                             │
//! │       │                                                                 │
//! │       │  db.sales().get_with_items(id)                                 │
//! │       ▼                                                                 │
//! │  SaleRepository                                                        │
//! │  ├── reads on the pool         (get_by_id, list, …)                    │
//! │  └── writes on a connection    (insert_sale, release, …)               │
//! │       │                           ▲                                     │
//! │       │                           └── caller's open transaction         │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Writes that belong to the sale commit protocol take a
//! `&mut SqliteConnection` so they join the caller's transaction.
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog reads and admin edits
//! - [`SaleRepository`](sale::SaleRepository) - Sale header and line items
//! - [`CustomerRepository`](customer::CustomerRepository) - Customers and loyalty points

pub mod customer;
pub mod product;
pub mod sale;

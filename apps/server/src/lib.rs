//! # MiniPOS Server
//!
//! JSON-over-HTTP front for the sale commit engine.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          MiniPOS Server                                 │
//! │                                                                         │
//! │  Till ───► HTTP (3000) ───► routes::sales ───► SaleEngine ───► SQLite   │
//! │                 │                                                       │
//! │                 └── TraceLayer (one span per request)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod routes;

use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use minipos_sales::SaleEngine;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub engine: SaleEngine,
}

impl AppState {
    pub fn new(engine: SaleEngine) -> Self {
        AppState { engine }
    }
}

/// Creates the router with every route and the request trace layer.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/sales",
            post(routes::sales::create).get(routes::sales::list),
        )
        .route(
            "/sales/{id}",
            get(routes::sales::get).delete(routes::sales::delete),
        )
        .route("/sales/{id}/status", patch(routes::sales::update_status))
        .route("/sales/{id}/void", post(routes::sales::void))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

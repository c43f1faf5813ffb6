//! # Menu API
//!
//! REST server for the restaurant digital menu.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                            Menu API                                     │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │ CatalogService │  │ VoucherService │  │  OrderService              ││
//! │  │                │  │                │  │                            ││
//! │  │ • CRUD         │  │ • CRUD         │  │ • Quote                    ││
//! │  │ • Seed menu    │  │ • Validate     │  │ • Checkout (+ voucher)     ││
//! │  │ • Discount     │  │ • Apply        │  │ • Status updates           ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  ┌────────────────┐  ┌──────────────────────────────────────────────┐  │
//! │  │SettingsService │  │  menu-notify                                 │  │
//! │  │ • Tax rates    │  │  BroadcastNotifier ──► /ws consoles          │  │
//! │  └────────────────┘  └──────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  menu-db: SQLite (products, vouchers, orders, tax_settings)      │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config`] for the TOML file and these environment variables:
//! - `MENU_CONFIG` - Config file path
//! - `MENU_BIND_ADDR`, `MENU_PORT` - Listen address (default: 0.0.0.0:5000)
//! - `MENU_DATABASE_PATH` - SQLite file (default: menu.db)
//! - `MENU_ORDER_NUMBERING` - `global` or `daily`
//! - `MENU_LOG` - Log filter when `RUST_LOG` is unset

use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod config;
pub mod error;
pub mod response;
pub mod services;
pub mod state;

// Re-exports
pub use config::AppConfig;
pub use error::{ApiError, ApiResult};
pub use state::AppState;

/// Builds the full application: REST routes, the `/ws` hub and request
/// tracing.
pub fn build_app(state: AppState) -> Router {
    let hub = Arc::clone(&state.hub);

    api::router()
        .with_state(state)
        .merge(hub.router::<()>())
        .layer(TraceLayer::new_for_http())
}
